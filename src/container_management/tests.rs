#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::timeout;
    use tokio_test::{assert_err, assert_ok};

    use crate::configuration::Config;
    use crate::container_management::runtime_adapter::{ContainerRuntime, LogFollower};
    use crate::container_management::test_support::{collecting_sink, failed, ok, FakeRuntime};
    use crate::container_management::{
        CommandOutput, ContainerState, LifecycleController, LogStream, Preset, STOP_NOT_FOUND,
    };
    use crate::error_handling::types::{AdapterError, ContainerError};
    use crate::session_management::{Subscription, LOG_STREAM_ENDED};

    fn controller(runtime: &Arc<FakeRuntime>) -> LifecycleController {
        LifecycleController::new(Config::default(), runtime.clone())
    }

    fn contains(args: &[String], value: &str) -> bool {
        args.iter().any(|a| a == value)
    }

    fn has_prefix(args: &[String], prefix: &str) -> bool {
        args.iter().any(|a| a.starts_with(prefix))
    }

    #[tokio::test]
    async fn test_start_safe_stops_then_launches_with_limits() {
        let runtime = FakeRuntime::new();
        let c = controller(&runtime);

        assert_ok!(c.start(Some(Preset::Safe)).await);

        assert_eq!(runtime.commands(), ["stop", "run"]);
        assert_eq!(runtime.calls()[0], ["stop", "sandbox-browser"]);
        let run = runtime.last_call("run").expect("run issued");
        assert!(contains(&run, "--cpus=1"));
        assert!(contains(&run, "--memory=1g"));
        assert!(contains(&run, "SANDBOX_MODE=safe"));
    }

    #[tokio::test]
    async fn test_start_proxy_uses_fractional_limits() {
        let runtime = FakeRuntime::new();
        let c = controller(&runtime);

        assert_ok!(c.start(Some(Preset::Proxy)).await);

        let run = runtime.last_call("run").expect("run issued");
        assert!(contains(&run, "--cpus=1.5"));
        assert!(contains(&run, "--memory=1.5g"));
        assert!(contains(&run, "SANDBOX_MODE=proxy"));
    }

    #[tokio::test]
    async fn test_start_without_preset_has_no_limits_or_mode_tag() {
        let runtime = FakeRuntime::new();
        let c = controller(&runtime);

        assert_ok!(c.start(None).await);

        let run = runtime.last_call("run").expect("run issued");
        assert!(!has_prefix(&run, "--cpus"));
        assert!(!has_prefix(&run, "--memory"));
        assert!(!has_prefix(&run, "SANDBOX_MODE"));
    }

    #[tokio::test]
    async fn test_start_named_with_unknown_preset_uses_default() {
        let runtime = FakeRuntime::new();
        let c = controller(&runtime);

        assert_ok!(c.start_named(Some("turbo")).await);
        let run = runtime.last_call("run").expect("run issued");
        assert!(!has_prefix(&run, "--cpus"));
        assert!(!has_prefix(&run, "SANDBOX_MODE"));

        assert_ok!(c.start_named(Some("malware")).await);
        let run = runtime.last_call("run").expect("run issued");
        assert!(contains(&run, "--cpus=2"));
        assert!(contains(&run, "--memory=2g"));
    }

    #[tokio::test]
    async fn test_start_returns_runtime_output_verbatim() {
        let runtime = FakeRuntime::new();
        runtime.respond("run", ok("4f2a9c1e0b7d\n"));
        let c = controller(&runtime);

        let output = assert_ok!(c.start(Some(Preset::Full)).await);
        assert_eq!(output, "4f2a9c1e0b7d\n");
    }

    #[tokio::test]
    async fn test_failed_stop_does_not_prevent_launch() {
        let runtime = FakeRuntime::new();
        runtime.respond("stop", failed("Error response from daemon: No such container: sandbox-browser\n", 1));
        let c = controller(&runtime);

        assert_ok!(c.start(Some(Preset::Safe)).await);
        assert_eq!(runtime.commands(), ["stop", "run"]);
    }

    #[tokio::test]
    async fn test_launch_failure_carries_runtime_diagnostic() {
        let runtime = FakeRuntime::new();
        let conflict = "docker: Error response from daemon: Conflict. The container name \"/sandbox-browser\" is already in use.\n";
        runtime.respond("run", failed(conflict, 125));
        let c = controller(&runtime);

        let err = assert_err!(c.start(Some(Preset::Safe)).await);
        assert!(matches!(err, ContainerError::LaunchFailed(_)));
        assert_eq!(err.diagnostic(), conflict);
    }

    #[tokio::test]
    async fn test_unreachable_daemon_is_runtime_not_available() {
        let runtime = FakeRuntime::new();
        runtime.respond(
            "run",
            failed(
                "Cannot connect to the Docker daemon at unix:///var/run/docker.sock. Is the docker daemon running?\n",
                1,
            ),
        );
        let c = controller(&runtime);

        let err = assert_err!(c.start(None).await);
        assert!(matches!(err, ContainerError::RuntimeNotAvailable(_)));
    }

    #[tokio::test]
    async fn test_missing_runtime_still_attempts_launch_once() {
        let runtime = FakeRuntime::new();
        runtime.respond_err("stop", AdapterError::RuntimeNotAvailable("docker: not found".into()));
        runtime.respond_err("run", AdapterError::RuntimeNotAvailable("docker: not found".into()));
        let c = controller(&runtime);

        let err = assert_err!(c.start(None).await);
        assert!(matches!(err, ContainerError::RuntimeNotAvailable(_)));
        assert_eq!(runtime.commands(), ["stop", "run"]);
    }

    #[tokio::test]
    async fn test_stop_returns_runtime_output_on_success() {
        let runtime = FakeRuntime::new();
        runtime.respond("stop", ok("sandbox-browser\n"));
        let c = controller(&runtime);

        assert_eq!(c.stop().await, "sandbox-browser\n");
        assert_eq!(runtime.calls(), [["stop", "sandbox-browser"]]);
    }

    #[tokio::test]
    async fn test_stop_never_fails() {
        let runtime = FakeRuntime::new();
        runtime.respond("stop", failed("Error: No such container: sandbox-browser\n", 1));
        runtime.respond_err("stop", AdapterError::RuntimeNotAvailable("docker: not found".into()));
        let c = controller(&runtime);

        assert_eq!(c.stop().await, STOP_NOT_FOUND);
        assert_eq!(c.stop().await, "already stopped or not found");
        assert_eq!(runtime.commands(), ["stop", "stop"]);
    }

    #[tokio::test]
    async fn test_reset_stops_then_starts_default() {
        let runtime = FakeRuntime::new();
        runtime.respond("stop", failed("No such container", 1));
        runtime.respond("stop", failed("No such container", 1));
        runtime.respond("run", ok("deadbeef\n"));
        let c = controller(&runtime);

        let output = assert_ok!(c.reset().await);
        assert_eq!(output, "deadbeef\n");
        assert_eq!(runtime.commands(), ["stop", "stop", "run"]);

        let run = runtime.last_call("run").expect("run issued");
        assert!(!has_prefix(&run, "--cpus"));
        assert!(!has_prefix(&run, "SANDBOX_MODE"));
    }

    #[tokio::test]
    async fn test_reset_discards_previous_preset() {
        let runtime = FakeRuntime::new();
        let c = controller(&runtime);

        assert_ok!(c.start(Some(Preset::Malware)).await);
        assert_ok!(c.reset().await);

        let run = runtime.last_call("run").expect("run issued");
        assert!(!has_prefix(&run, "--cpus"));
        assert!(!has_prefix(&run, "--memory"));
    }

    #[tokio::test]
    async fn test_reset_surfaces_launch_failure() {
        let runtime = FakeRuntime::new();
        runtime.respond("run", failed("invalid reference format\n", 125));
        let c = controller(&runtime);

        let err = assert_err!(c.reset().await);
        assert_eq!(err.diagnostic(), "invalid reference format\n");
    }

    #[tokio::test]
    async fn test_status_is_queried_from_runtime() {
        let runtime = FakeRuntime::new();
        runtime.respond("inspect", ok("running\n"));
        runtime.respond("inspect", ok("exited\n"));
        runtime.respond("inspect", failed("Error: No such object: sandbox-browser\n", 1));
        let c = controller(&runtime);

        assert_eq!(assert_ok!(c.status().await), ContainerState::Running);
        assert_eq!(
            assert_ok!(c.status().await),
            ContainerState::NotRunning("exited".to_string())
        );
        assert_eq!(assert_ok!(c.status().await), ContainerState::NotFound);
        assert_eq!(runtime.commands(), ["inspect", "inspect", "inspect"]);
        assert_eq!(
            runtime.calls()[0],
            ["inspect", "--format", "{{.State.Status}}", "sandbox-browser"]
        );
    }

    #[tokio::test]
    async fn test_status_failures_are_classified() {
        let runtime = FakeRuntime::new();
        runtime.respond("inspect", failed("Cannot connect to the Docker daemon\n", 1));
        runtime.respond("inspect", failed("template parsing error\n", 1));
        let c = controller(&runtime);

        assert!(matches!(
            c.status().await,
            Err(ContainerError::RuntimeNotAvailable(_))
        ));
        assert!(matches!(c.status().await, Err(ContainerError::QueryFailed(_))));
    }

    #[tokio::test]
    async fn test_double_subscribe_spawns_one_follower() {
        let runtime = FakeRuntime::new();
        let c = controller(&runtime);
        let (sink, _) = collecting_sink();

        assert!(matches!(
            assert_ok!(c.subscribe_logs(sink.clone())),
            Subscription::Started(_)
        ));
        assert!(matches!(
            assert_ok!(c.subscribe_logs(sink)),
            Subscription::AlreadyStreaming(_)
        ));
        assert_eq!(runtime.follow_count(), 1);
        assert!(c.log_session().is_some());
    }

    #[tokio::test]
    async fn test_container_exit_ends_log_subscription() {
        let runtime = FakeRuntime::new();
        let c = controller(&runtime);
        let (sink, received) = collecting_sink();

        assert_ok!(c.subscribe_logs(sink));
        runtime.emit(LogStream::Stdout, "navigated to about:blank\n");
        runtime.close_stream();

        timeout(Duration::from_secs(5), async {
            while c.log_session().is_some() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("log session should end");

        let received = received.lock().unwrap().clone();
        assert_eq!(received.last().map(String::as_str), Some(LOG_STREAM_ENDED));
        assert_eq!(received.len(), 2);
    }

    #[tokio::test]
    async fn test_unsubscribe_without_session_is_harmless() {
        let runtime = FakeRuntime::new();
        let c = controller(&runtime);

        assert!(!c.unsubscribe_logs().await);
        assert!(c.log_session().is_none());
    }

    /// Runtime that yields in the middle of every call, so unserialized
    /// operations would interleave.
    #[derive(Default)]
    struct InterleavingRuntime {
        trace: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ContainerRuntime for InterleavingRuntime {
        fn backend_name(&self) -> &str {
            "interleaving"
        }

        async fn run(&self, args: &[String]) -> Result<CommandOutput, AdapterError> {
            let command = args[0].clone();
            self.trace.lock().unwrap().push(format!("begin {}", command));
            for _ in 0..5 {
                tokio::task::yield_now().await;
            }
            self.trace.lock().unwrap().push(format!("end {}", command));
            Ok(ok(""))
        }

        fn follow(&self, _args: &[String]) -> Result<LogFollower, AdapterError> {
            Err(AdapterError::RuntimeNotAvailable("not supported".into()))
        }
    }

    #[tokio::test]
    async fn test_overlapping_operations_are_serialized() {
        let runtime = Arc::new(InterleavingRuntime::default());
        let c = LifecycleController::new(Config::default(), runtime.clone());

        let (a, b, s) = tokio::join!(c.start(Some(Preset::Safe)), c.reset(), c.stop());
        assert_ok!(a);
        assert_ok!(b);
        assert_eq!(s, "OK");

        let trace = runtime.trace.lock().unwrap().clone();
        assert_eq!(trace.len(), 12);
        for pair in trace.chunks(2) {
            let begun = pair[0].strip_prefix("begin ").expect("begin first");
            let ended = pair[1].strip_prefix("end ").expect("end second");
            assert_eq!(begun, ended, "operations interleaved: {:?}", trace);
        }
    }
}
