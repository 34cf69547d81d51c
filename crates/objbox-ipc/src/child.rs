//! Child-side runtime loop, run inside the isolated environment.
//!
//! State machine: INIT until a successful SETUP, then READY serving one
//! request at a time. Errors raised while serving a request are reported as
//! EXCEPTION replies and the loop keeps serving; only a broken channel ends
//! the loop. QUIT runs the scoped teardown and reports a clean shutdown
//! before the process exits.

use objbox_core::error::{Error, RemoteErrorKind, Result};
use objbox_core::observer::Observer;
use objbox_core::problem::{factory_for, BlackBoxInstance, CreatedProblem};

use crate::channel::MessageChannel;
use crate::message::Message;

/// Serve `factory_name` on the channel at `port`. This is the body of the
/// run-script contract: the entrypoint receives `port` and `secret` and
/// calls here after parsing them.
///
/// `local_observer`, when given, is notified of each successful evaluation
/// on this side of the channel.
pub fn run_child(
    factory_name: &str,
    port: u16,
    secret: &str,
    mut local_observer: Option<Box<dyn Observer>>,
) -> Result<()> {
    let mut channel = MessageChannel::connect(port, secret)?;
    tracing::debug!(factory = factory_name, port, "child connected");

    // INIT: nothing is served before a successful SETUP.
    let mut instance = loop {
        match channel.recv() {
            Ok(Message::Setup { seed }) => match setup(factory_name, seed) {
                Ok((mut instance, x0, y0)) => {
                    if let Some(mut observer) = local_observer.take() {
                        match observer.initialize(instance.info(), None, Some(&x0), Some(&y0), seed)
                        {
                            Ok(_) => instance.attach_observer(observer),
                            Err(e) => {
                                tracing::warn!(error = %e, "local observer failed to initialize, detaching")
                            }
                        }
                    }
                    let info = instance.info().clone();
                    channel.send(&Message::SetupOk { x0, y0, info })?;
                    break instance;
                }
                Err((kind, diagnostic)) => {
                    tracing::error!(%diagnostic, "setup failed");
                    channel.send(&Message::Exception { kind, diagnostic })?;
                    return Ok(());
                }
            },
            Ok(Message::Quit) => {
                channel.send(&Message::ShutdownOk)?;
                return Ok(());
            }
            Ok(other) => {
                channel.send(&Message::Exception {
                    kind: RemoteErrorKind::Protocol,
                    diagnostic: format!("cannot serve '{}' before setup", other.kind()),
                })?;
            }
            Err(Error::ChannelClosed) => {
                tracing::warn!("channel closed before setup");
                return Ok(());
            }
            Err(e) => return Err(e),
        }
    };

    // READY: strictly serialized request/reply.
    loop {
        match channel.recv() {
            Ok(Message::Query { x, context }) => {
                let reply = match instance.evaluate(&x, context.as_ref()) {
                    Ok(y) => Message::Reply { y },
                    Err(e) => Message::Exception {
                        kind: RemoteErrorKind::Evaluation,
                        diagnostic: e.to_string(),
                    },
                };
                channel.send(&reply)?;
            }
            Ok(Message::Attribute { attr }) => {
                let reply = match instance.attribute(attr) {
                    Ok(value) => Message::AttributeOk { value },
                    Err(e) => Message::Exception {
                        kind: RemoteErrorKind::Evaluation,
                        diagnostic: e.to_string(),
                    },
                };
                channel.send(&reply)?;
            }
            Ok(Message::Quit) => {
                if let Err(e) = instance.terminate() {
                    tracing::warn!(error = %e, "teardown reported an error");
                }
                channel.send(&Message::ShutdownOk)?;
                tracing::debug!("child shut down cleanly");
                return Ok(());
            }
            Ok(other) => {
                channel.send(&Message::Exception {
                    kind: RemoteErrorKind::Protocol,
                    diagnostic: format!("unexpected '{}' while ready", other.kind()),
                })?;
            }
            Err(Error::ChannelClosed) => {
                tracing::warn!("channel closed without quit");
                return Ok(());
            }
            Err(e) => return Err(e),
        }
    }
}

type SetupFailure = (RemoteErrorKind, String);

fn setup(
    factory_name: &str,
    seed: u64,
) -> std::result::Result<(BlackBoxInstance, Vec<Vec<String>>, Vec<Vec<f64>>), SetupFailure> {
    let factory = factory_for(factory_name).ok_or_else(|| {
        (
            RemoteErrorKind::UnknownFactory,
            format!("factory '{factory_name}' is not in this catalog"),
        )
    })?;
    let CreatedProblem { black_box, x0, y0 } = factory
        .create(seed)
        .map_err(|e| (RemoteErrorKind::Setup, e.to_string()))?;
    Ok((BlackBoxInstance::new(black_box), x0, y0))
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::thread;

    use objbox_core::problem::{AttributeRequest, AttributeValue};

    use super::*;
    use crate::channel;

    fn spawn_child(factory: &'static str) -> (MessageChannel, thread::JoinHandle<Result<()>>) {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        let secret = channel::generate_secret();
        let child_secret = secret.clone();
        let handle = thread::spawn(move || run_child(factory, port, &child_secret, None));
        let channel = MessageChannel::accept(&listener, &secret).unwrap();
        (channel, handle)
    }

    fn batch(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn full_session_setup_query_attribute_quit() {
        let (mut channel, handle) = spawn_child("aloha");

        channel.send(&Message::Setup { seed: 0 }).unwrap();
        match channel.recv().unwrap() {
            Message::SetupOk { x0, y0, info } => {
                assert_eq!(x0, batch(&[&["A", "L", "O", "O", "F"]]));
                assert_eq!(y0, vec![vec![3.0]]);
                assert_eq!(info.name, "aloha");
            }
            other => panic!("expected setup_ok, got {}", other.kind()),
        }

        channel
            .send(&Message::Query {
                x: batch(&[&["A", "L", "O", "H", "A"]]),
                context: None,
            })
            .unwrap();
        assert_eq!(channel.recv().unwrap(), Message::Reply { y: vec![vec![5.0]] });

        channel
            .send(&Message::Attribute {
                attr: AttributeRequest::ProblemName,
            })
            .unwrap();
        assert_eq!(
            channel.recv().unwrap(),
            Message::AttributeOk {
                value: AttributeValue::Text("aloha".into())
            }
        );

        channel.send(&Message::Quit).unwrap();
        assert_eq!(channel.recv().unwrap(), Message::ShutdownOk);
        handle.join().unwrap().unwrap();
    }

    #[test]
    fn evaluation_error_becomes_exception_and_loop_survives() {
        let (mut channel, handle) = spawn_child("aloha");
        channel.send(&Message::Setup { seed: 0 }).unwrap();
        assert!(matches!(channel.recv().unwrap(), Message::SetupOk { .. }));

        channel
            .send(&Message::Query {
                x: batch(&[&["A", "L"]]),
                context: None,
            })
            .unwrap();
        match channel.recv().unwrap() {
            Message::Exception { kind, diagnostic } => {
                assert_eq!(kind, RemoteErrorKind::Evaluation);
                assert!(diagnostic.contains("length"));
            }
            other => panic!("expected exception, got {}", other.kind()),
        }

        // Same channel keeps serving.
        channel
            .send(&Message::Query {
                x: batch(&[&["A", "L", "O", "H", "A"]]),
                context: None,
            })
            .unwrap();
        assert!(matches!(channel.recv().unwrap(), Message::Reply { .. }));

        channel.send(&Message::Quit).unwrap();
        assert_eq!(channel.recv().unwrap(), Message::ShutdownOk);
        handle.join().unwrap().unwrap();
    }

    #[test]
    fn unknown_factory_is_reported_then_child_exits() {
        let (mut channel, handle) = spawn_child("no_such_problem");
        channel.send(&Message::Setup { seed: 0 }).unwrap();
        match channel.recv().unwrap() {
            Message::Exception { kind, .. } => assert_eq!(kind, RemoteErrorKind::UnknownFactory),
            other => panic!("expected exception, got {}", other.kind()),
        }
        handle.join().unwrap().unwrap();
    }

    #[test]
    fn query_before_setup_is_a_protocol_exception() {
        let (mut channel, handle) = spawn_child("aloha");
        channel
            .send(&Message::Query {
                x: batch(&[&["A", "L", "O", "H", "A"]]),
                context: None,
            })
            .unwrap();
        match channel.recv().unwrap() {
            Message::Exception { kind, .. } => assert_eq!(kind, RemoteErrorKind::Protocol),
            other => panic!("expected exception, got {}", other.kind()),
        }

        // INIT is still serviceable.
        channel.send(&Message::Setup { seed: 0 }).unwrap();
        assert!(matches!(channel.recv().unwrap(), Message::SetupOk { .. }));
        channel.send(&Message::Quit).unwrap();
        assert_eq!(channel.recv().unwrap(), Message::ShutdownOk);
        handle.join().unwrap().unwrap();
    }

    #[test]
    fn dropped_channel_ends_the_loop_cleanly() {
        let (channel, handle) = spawn_child("aloha");
        drop(channel);
        handle.join().unwrap().unwrap();
    }
}
