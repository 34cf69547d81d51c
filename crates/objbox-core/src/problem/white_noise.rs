//! Seeded noise problem: one uniform sample per input row.
//!
//! Reproducibility matters more than the distribution here: the same seed
//! must yield the same outputs whether the box runs in-process or in an
//! isolated child, which is what the cross-path equivalence tests check.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::problem::{
    BlackBox, CreatedProblem, EvalContext, InputBatch, OutputBatch, ProblemFactory, ProblemInfo,
};

struct WhiteNoiseBlackBox {
    info: ProblemInfo,
    rng: StdRng,
}

impl BlackBox for WhiteNoiseBlackBox {
    fn info(&self) -> &ProblemInfo {
        &self.info
    }

    fn evaluate(
        &mut self,
        x: &InputBatch,
        _context: Option<&EvalContext>,
    ) -> Result<OutputBatch> {
        Ok(x.iter().map(|_| vec![self.rng.gen::<f64>()]).collect())
    }
}

pub struct WhiteNoiseFactory;

impl ProblemFactory for WhiteNoiseFactory {
    fn info(&self) -> ProblemInfo {
        ProblemInfo::new("white_noise")
    }

    fn create(&self, seed: u64) -> Result<CreatedProblem> {
        let mut black_box = WhiteNoiseBlackBox {
            info: self.info(),
            rng: StdRng::seed_from_u64(seed),
        };
        let x0: InputBatch = vec![vec!["0".to_string(), "0".to_string(), "0".to_string()]];
        let y0 = black_box.evaluate(&x0, None)?;
        Ok(CreatedProblem {
            black_box: Box::new(black_box),
            x0,
            y0,
        })
    }
}
