//! [`CommandExecutor`] – runs a resolved command list in order.
//!
//! Each [`CommandSpec`] is classified by [`CommandSpec::kind`]:
//!
//! * [`CommandKind::Device`] – handed to the [`CommandSink`], fire-and-forget.
//! * [`CommandKind::Wait`] – suspends the calling dispatch for the first
//!   candidate token that reads as a duration in seconds, then ends the
//!   execution successfully.  Commands listed after a `wait` never run.
//!   Without a usable duration the execution ends with
//!   [`C2cError::WaitArgumentMissing`].
//!
//! The wait is a Tokio timer, so only the calling task is suspended.

use std::sync::Arc;
use std::time::Duration;

use aliveos_middleware::CommandSink;
use aliveos_types::{C2cError, CommandKind, CommandSpec};
use tracing::{debug, error};

pub struct CommandExecutor {
    sink: Arc<dyn CommandSink>,
}

impl CommandExecutor {
    pub fn new(sink: Arc<dyn CommandSink>) -> Self {
        Self { sink }
    }

    pub async fn run(&self, commands: &[CommandSpec]) -> Result<(), C2cError> {
        for spec in commands {
            debug!(?spec, "c2c -> dev");
            match spec.kind() {
                CommandKind::Wait { candidates } => return Self::wait(&candidates).await,
                CommandKind::Device(command) => self.sink.emit_device_command(command),
            }
        }
        Ok(())
    }

    async fn wait(candidates: &[String]) -> Result<(), C2cError> {
        match parse_duration(candidates) {
            Some(duration) => {
                debug!(?duration, "waiting");
                tokio::time::sleep(duration).await;
                Ok(())
            }
            None => {
                error!(?candidates, "Wait concept has no duration argument!");
                Err(C2cError::WaitArgumentMissing)
            }
        }
    }
}

/// First token that parses as a finite, non-negative number of seconds.
pub fn parse_duration(candidates: &[String]) -> Option<Duration> {
    candidates.iter().find_map(|token| {
        token
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use aliveos_types::{CommandArgs, ControlSignal, DeviceCommand};
    use std::sync::Mutex;
    use std::time::Instant;

    /// Sink that records everything it is handed, in order.
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub(crate) log: Mutex<Vec<Emitted>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Emitted {
        Device(DeviceCommand),
        Signal(ControlSignal),
    }

    impl RecordingSink {
        pub(crate) fn emitted(&self) -> Vec<Emitted> {
            self.log.lock().unwrap().clone()
        }
    }

    impl CommandSink for RecordingSink {
        fn emit_device_command(&self, command: DeviceCommand) {
            self.log.lock().unwrap().push(Emitted::Device(command));
        }

        fn emit_control_signal(&self, signal: ControlSignal) {
            self.log.lock().unwrap().push(Emitted::Signal(signal));
        }
    }

    fn device(cmd: &str, arg: &str) -> CommandSpec {
        CommandSpec::new("wheels", cmd, Some(CommandArgs::Single(arg.to_string())))
    }

    fn wait(args: &[&str]) -> CommandSpec {
        CommandSpec::new(
            "",
            "wait",
            Some(CommandArgs::List(args.iter().map(|a| a.to_string()).collect())),
        )
    }

    #[test]
    fn parse_duration_skips_non_numeric_and_negative_tokens() {
        let tokens = |t: &[&str]| t.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(
            parse_duration(&tokens(&["soon", "-1", "0.25"])),
            Some(Duration::from_millis(250))
        );
        assert_eq!(parse_duration(&tokens(&["NaN", "inf"])), None);
        assert_eq!(parse_duration(&tokens(&[])), None);
        assert_eq!(parse_duration(&tokens(&["2"])), Some(Duration::from_secs(2)));
    }

    #[tokio::test]
    async fn device_commands_are_forwarded_in_order() {
        let sink = Arc::new(RecordingSink::default());
        let executor = CommandExecutor::new(sink.clone());

        executor
            .run(&[device("forward", "1.0"), device("stop", "")])
            .await
            .unwrap();

        let emitted = sink.emitted();
        assert_eq!(emitted.len(), 2);
        assert_eq!(
            emitted[0],
            Emitted::Device(DeviceCommand {
                device: "wheels".into(),
                command: "forward".into(),
                argument: "1.0".into(),
            })
        );
        assert!(matches!(&emitted[1], Emitted::Device(c) if c.command == "stop"));
    }

    #[tokio::test]
    async fn wait_suspends_and_stops_the_list() {
        let sink = Arc::new(RecordingSink::default());
        let executor = CommandExecutor::new(sink.clone());

        let started = Instant::now();
        executor
            .run(&[device("forward", "1.0"), wait(&["0.05"]), device("stop", "")])
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(50));
        // Only the command before the wait was emitted.
        assert_eq!(sink.emitted().len(), 1);
    }

    #[tokio::test]
    async fn wait_without_duration_is_an_error() {
        let sink = Arc::new(RecordingSink::default());
        let executor = CommandExecutor::new(sink.clone());

        let result = executor
            .run(&[wait(&["later"]), device("forward", "1.0")])
            .await;

        assert_eq!(result, Err(C2cError::WaitArgumentMissing));
        assert!(sink.emitted().is_empty());
    }

    #[tokio::test]
    async fn wait_without_arguments_is_an_error() {
        let executor = CommandExecutor::new(Arc::new(RecordingSink::default()));
        let result = executor.run(&[CommandSpec::new("", "wait", None)]).await;
        assert_eq!(result, Err(C2cError::WaitArgumentMissing));
    }

    #[tokio::test]
    async fn empty_command_list_succeeds() {
        let executor = CommandExecutor::new(Arc::new(RecordingSink::default()));
        assert!(executor.run(&[]).await.is_ok());
    }
}
