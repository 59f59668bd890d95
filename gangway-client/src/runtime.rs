//! Mode selection for the renderer-facing API
//!
//! The host environment is injected, not read from process-global state:
//! embedders pass the shell marker and, in native mode, the bridge the
//! shell installed. Detection runs once per [`connect`] call and the
//! verdict is fixed for the returned facade's lifetime.

use crate::remote::RemoteBridge;
use gangway_core::{detect, Bridge, RemoteConfig, RuntimeMode, ShellMarker};
use std::sync::Arc;

/// Everything [`connect`] needs to know about the host.
pub struct HostEnv {
    pub marker: Option<ShellMarker>,
    pub bridge: Option<Arc<dyn Bridge>>,
    pub config: RemoteConfig,
}

impl HostEnv {
    /// Browser-style environment: no shell marker, endpoints resolved from
    /// the process environment.
    pub fn browser() -> Self {
        Self {
            marker: None,
            bridge: None,
            config: RemoteConfig::from_env(),
        }
    }

    /// Desktop-shell environment wrapping the bridge the shell installed.
    pub fn native(bridge: Arc<dyn Bridge>) -> Self {
        Self {
            marker: Some(ShellMarker { native_shell: true }),
            bridge: Some(bridge),
            config: RemoteConfig::default(),
        }
    }

    pub fn mode(&self) -> RuntimeMode {
        detect(self.marker.as_ref())
    }

    /// Companion server base URL. Remote mode only.
    ///
    /// # Panics
    ///
    /// In native mode. Asking for a remote endpoint there is a programming
    /// error that should surface immediately rather than silently point a
    /// caller at the wrong transport.
    pub fn server_url(&self) -> &str {
        assert!(
            self.mode().is_remote(),
            "server_url() called in native mode"
        );
        &self.config.server_url
    }

    /// Event channel URL. Remote mode only.
    ///
    /// # Panics
    ///
    /// In native mode, for the same reason as [`HostEnv::server_url`].
    pub fn events_url(&self) -> &str {
        assert!(
            self.mode().is_remote(),
            "events_url() called in native mode"
        );
        &self.config.events_url
    }
}

/// Resolve the capability surface for this process.
///
/// The mode verdict is computed once here; every call through the returned
/// bridge uses the same transport until the process exits. Remote mode
/// never fails: the adapter is constructed without touching the network.
///
/// # Panics
///
/// When the marker claims a native shell but no bridge was injected — the
/// environment is misconfigured and continuing would silently route native
/// calls over the wrong transport.
pub fn connect(env: HostEnv) -> Arc<dyn Bridge> {
    match env.mode() {
        RuntimeMode::Native => env.bridge.unwrap_or_else(|| {
            panic!("shell marker claims a native shell but no bridge was injected")
        }),
        RuntimeMode::Remote => Arc::new(RemoteBridge::new(env.config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gangway_core::{
        ApiKeyStatus, Channel, EventCallback, KeyValidation, ProviderSettings, Result,
        Subscription, TaskSnapshot, TaskSpec,
    };
    use std::collections::BTreeMap;

    /// Minimal stand-in for the bridge a desktop shell would install.
    struct FakeShell;

    #[async_trait]
    impl Bridge for FakeShell {
        async fn app_version(&self) -> Result<String> {
            Ok("9.9.9-shell".to_string())
        }
        async fn platform(&self) -> Result<String> {
            Ok("testos".to_string())
        }
        async fn has_any_api_key(&self) -> Result<bool> {
            Ok(false)
        }
        async fn list_api_keys(&self) -> Result<BTreeMap<String, ApiKeyStatus>> {
            Ok(BTreeMap::new())
        }
        async fn api_key_exists(&self, _provider: &str) -> Result<bool> {
            Ok(false)
        }
        async fn get_api_key(&self, _provider: &str) -> Result<Option<String>> {
            Ok(None)
        }
        async fn set_api_key(
            &self,
            _provider: &str,
            _key: &str,
            _label: Option<&str>,
        ) -> Result<()> {
            Ok(())
        }
        async fn delete_api_key(&self, _provider: &str) -> Result<()> {
            Ok(())
        }
        async fn validate_api_key(&self, _provider: &str, key: &str) -> Result<KeyValidation> {
            Ok(KeyValidation {
                valid: !key.is_empty(),
                error: None,
                warning: "format check only".to_string(),
            })
        }
        async fn start_task(&self, _spec: TaskSpec) -> Result<String> {
            Ok("task-1".to_string())
        }
        async fn cancel_task(&self, _task_id: &str) -> Result<()> {
            Ok(())
        }
        async fn task_snapshot(&self, task_id: &str) -> Result<TaskSnapshot> {
            Ok(TaskSnapshot {
                task_id: task_id.to_string(),
                state: "running".to_string(),
                detail: None,
            })
        }
        async fn respond_permission(&self, _request_id: &str, _allow: bool) -> Result<()> {
            Ok(())
        }
        async fn resume_session(&self, _session_id: &str) -> Result<()> {
            Ok(())
        }
        async fn set_debug_mode(&self, _enabled: bool) -> Result<()> {
            Ok(())
        }
        async fn provider_settings(&self, _provider: &str) -> Result<ProviderSettings> {
            Ok(ProviderSettings::default())
        }
        async fn set_provider_settings(
            &self,
            _provider: &str,
            _settings: ProviderSettings,
        ) -> Result<()> {
            Ok(())
        }
        async fn onboarding_complete(&self) -> Result<bool> {
            Ok(true)
        }
        async fn set_onboarding_complete(&self, _complete: bool) -> Result<()> {
            Ok(())
        }
        fn subscribe(&self, _channel: Channel, _callback: EventCallback) -> Result<Subscription> {
            Ok(Subscription::new(|| {}))
        }
    }

    #[tokio::test]
    async fn native_env_returns_the_injected_bridge() {
        let bridge = connect(HostEnv::native(Arc::new(FakeShell)));
        assert_eq!(bridge.app_version().await.unwrap(), "9.9.9-shell");
    }

    #[test]
    #[should_panic(expected = "no bridge was injected")]
    fn native_marker_without_bridge_panics() {
        let env = HostEnv {
            marker: Some(ShellMarker { native_shell: true }),
            bridge: None,
            config: RemoteConfig::default(),
        };
        let _ = connect(env);
    }

    #[tokio::test]
    async fn remote_connect_never_panics_and_stays_remote() {
        let env = HostEnv {
            marker: None,
            bridge: None,
            config: RemoteConfig::default(),
        };
        let bridge = connect(env);
        // Mode is fixed: stubbed operations fail identically on every call.
        let first = bridge.start_task(TaskSpec::default()).await.unwrap_err();
        let second = bridge.start_task(TaskSpec::default()).await.unwrap_err();
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn unset_marker_flag_is_remote() {
        let env = HostEnv {
            marker: Some(ShellMarker {
                native_shell: false,
            }),
            bridge: None,
            config: RemoteConfig::default(),
        };
        assert!(env.mode().is_remote());
        assert_eq!(env.server_url(), "http://localhost:3001");
    }

    #[test]
    #[should_panic(expected = "server_url() called in native mode")]
    fn server_url_panics_in_native_mode() {
        let env = HostEnv::native(Arc::new(FakeShell));
        let _ = env.server_url();
    }

    #[test]
    #[should_panic(expected = "events_url() called in native mode")]
    fn events_url_panics_in_native_mode() {
        let env = HostEnv::native(Arc::new(FakeShell));
        let _ = env.events_url();
    }
}
