//! Caller-visible proxy for a black box living in another process.
//!
//! Implements the same call contract as a local black box: each invocation
//! serializes one QUERY and blocks for its paired reply, an EXCEPTION reply
//! is re-raised here with the remote diagnostic preserved, and attribute
//! access not satisfiable from the cached problem info is resolved over the
//! wire. `terminate` is idempotent and runs on drop.

use objbox_core::error::{Error, Result};
use objbox_core::problem::{
    AttributeRequest, AttributeValue, BlackBox, EvalContext, InputBatch, OutputBatch, ProblemInfo,
};

use crate::message::Message;
use crate::process_wrapper::ProcessWrapper;

pub struct ExternalBlackBox {
    info: ProblemInfo,
    wrapper: Option<ProcessWrapper>,
}

impl ExternalBlackBox {
    /// Drive the SETUP handshake on a freshly started wrapper. On success,
    /// the proxy owns the process handle for the rest of its life.
    pub fn setup(
        mut wrapper: ProcessWrapper,
        seed: u64,
    ) -> Result<(Self, InputBatch, OutputBatch)> {
        wrapper.send(&Message::Setup { seed })?;
        match wrapper.recv()? {
            Message::SetupOk { x0, y0, info } => Ok((
                Self {
                    info,
                    wrapper: Some(wrapper),
                },
                x0,
                y0,
            )),
            Message::Exception { kind, diagnostic } => {
                Err(Error::RemoteEvaluation { kind, diagnostic })
            }
            other => Err(Error::Protocol(format!(
                "expected setup_ok or exception, received '{}'",
                other.kind()
            ))),
        }
    }

    /// Send QUIT, wait for the clean-shutdown report (best effort), release
    /// the process handle. Idempotent.
    pub fn terminate(&mut self) -> Result<()> {
        let Some(mut wrapper) = self.wrapper.take() else {
            return Ok(());
        };
        match wrapper.send(&Message::Quit) {
            Ok(()) => match wrapper.recv() {
                Ok(Message::ShutdownOk) => {}
                Ok(other) => {
                    tracing::warn!(kind = other.kind(), "unexpected reply to quit")
                }
                Err(Error::ChannelClosed) => {}
                Err(e) => tracing::warn!(error = %e, "error waiting for shutdown report"),
            },
            // Peer already gone; close() below still reaps the process.
            Err(Error::ChannelClosed) => {}
            Err(e) => {
                wrapper.close()?;
                return Err(e);
            }
        }
        wrapper.close()
    }

    fn wrapper(&mut self) -> Result<&mut ProcessWrapper> {
        self.wrapper.as_mut().ok_or(Error::ChannelClosed)
    }
}

impl BlackBox for ExternalBlackBox {
    fn info(&self) -> &ProblemInfo {
        &self.info
    }

    fn evaluate(
        &mut self,
        x: &InputBatch,
        context: Option<&EvalContext>,
    ) -> Result<OutputBatch> {
        let wrapper = self.wrapper()?;
        wrapper.send(&Message::Query {
            x: x.clone(),
            context: context.cloned(),
        })?;
        match wrapper.recv()? {
            Message::Reply { y } => Ok(y),
            Message::Exception { kind, diagnostic } => {
                tracing::error!(%diagnostic, "remote evaluation failed");
                Err(Error::RemoteEvaluation { kind, diagnostic })
            }
            other => Err(Error::Protocol(format!(
                "expected reply or exception, received '{}'",
                other.kind()
            ))),
        }
    }

    fn attribute(&mut self, attr: AttributeRequest) -> Result<AttributeValue> {
        let wrapper = self.wrapper()?;
        wrapper.send(&Message::Attribute { attr })?;
        match wrapper.recv()? {
            Message::AttributeOk { value } => Ok(value),
            Message::Exception { kind, diagnostic } => {
                Err(Error::RemoteEvaluation { kind, diagnostic })
            }
            other => Err(Error::Protocol(format!(
                "expected attribute_ok or exception, received '{}'",
                other.kind()
            ))),
        }
    }

    fn terminate(&mut self) -> Result<()> {
        ExternalBlackBox::terminate(self)
    }
}

impl Drop for ExternalBlackBox {
    fn drop(&mut self) {
        if let Err(e) = self.terminate() {
            tracing::warn!(error = %e, "external black box teardown failed on drop");
        }
    }
}
