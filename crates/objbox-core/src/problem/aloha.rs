//! Toy sequence problem: counts positional matches against "ALOHA".
//!
//! Exists to exercise the full registration/isolation machinery with a
//! function whose outputs are trivial to verify by hand.

use crate::error::{Error, Result};
use crate::problem::{
    BlackBox, CreatedProblem, EvalContext, InputBatch, OutputBatch, ProblemFactory, ProblemInfo,
};

const TARGET: [&str; 5] = ["A", "L", "O", "H", "A"];

struct AlohaBlackBox {
    info: ProblemInfo,
}

impl BlackBox for AlohaBlackBox {
    fn info(&self) -> &ProblemInfo {
        &self.info
    }

    fn evaluate(
        &mut self,
        x: &InputBatch,
        _context: Option<&EvalContext>,
    ) -> Result<OutputBatch> {
        x.iter()
            .enumerate()
            .map(|(i, row)| {
                if row.len() != TARGET.len() {
                    return Err(Error::Evaluation(format!(
                        "aloha expects rows of length {}, row {} has length {}",
                        TARGET.len(),
                        i,
                        row.len()
                    )));
                }
                let matches = row
                    .iter()
                    .zip(TARGET.iter())
                    .filter(|(token, target)| token.as_str() == **target)
                    .count();
                Ok(vec![matches as f64])
            })
            .collect()
    }
}

pub struct AlohaFactory;

impl ProblemFactory for AlohaFactory {
    fn info(&self) -> ProblemInfo {
        let alphabet = ('A'..='Z').map(|c| c.to_string()).collect();
        ProblemInfo::new("aloha")
            .with_sequence_length(TARGET.len(), true)
            .with_alphabet(alphabet)
    }

    fn create(&self, _seed: u64) -> Result<CreatedProblem> {
        let mut black_box = AlohaBlackBox { info: self.info() };
        let x0: InputBatch = vec![["A", "L", "O", "O", "F"]
            .iter()
            .map(|s| s.to_string())
            .collect()];
        let y0 = black_box.evaluate(&x0, None)?;
        Ok(CreatedProblem {
            black_box: Box::new(black_box),
            x0,
            y0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_design_scores_three() {
        let created = AlohaFactory.create(0).unwrap();
        assert_eq!(created.x0, vec![vec!["A", "L", "O", "O", "F"]]);
        assert_eq!(created.y0, vec![vec![3.0]]);
    }

    #[test]
    fn perfect_match_scores_five() {
        let mut created = AlohaFactory.create(0).unwrap();
        let x = vec![TARGET.iter().map(|s| s.to_string()).collect()];
        let y = created.black_box.evaluate(&x, None).unwrap();
        assert_eq!(y, vec![vec![5.0]]);
    }

    #[test]
    fn wrong_row_length_is_an_evaluation_error() {
        let mut created = AlohaFactory.create(0).unwrap();
        let x = vec![vec!["A".to_string(), "L".to_string()]];
        let err = created.black_box.evaluate(&x, None).unwrap_err();
        assert!(err.to_string().contains("length"));
    }
}
