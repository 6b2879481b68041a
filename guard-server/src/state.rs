use crate::authz::AuthorizationGate;
use crate::config::{ConfigError, GuardConfig, SandboxConfig, SandboxMode};
use crate::keys::KeyMaterial;
use crate::oauth::{TokenIssuer, TokenValidator};
use crate::tools::{ExecutionController, ToolRegistry};
use guard_sandbox::{ProcessSandbox, SandboxExecutor, SimulatedSandbox};
use log::info;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GuardConfig>,
    pub keys: Arc<KeyMaterial>,
    pub issuer: Arc<TokenIssuer>,
    pub gate: Arc<AuthorizationGate>,
    pub registry: Arc<ToolRegistry>,
    pub controller: Arc<ExecutionController>,
}

impl AppState {
    /// Builds the state with the sandbox executor selected by configuration
    pub fn new(config: GuardConfig, keys: KeyMaterial) -> Result<Self, ConfigError> {
        let sandbox = Self::create_sandbox(&config.sandbox)?;
        Ok(Self::with_sandbox(config, keys, sandbox))
    }

    /// Builds the state around an explicit sandbox executor
    pub fn with_sandbox(
        config: GuardConfig,
        keys: KeyMaterial,
        sandbox: Arc<dyn SandboxExecutor>,
    ) -> Self {
        let keys = Arc::new(keys);
        let registry = Arc::new(ToolRegistry::builtin());

        let issuer = TokenIssuer::new(keys.clone(), &config.oauth);
        let validator = TokenValidator::from_config(keys.clone(), &config.resource);
        let gate = AuthorizationGate::new(validator, config.resource.realm.clone());
        let controller = ExecutionController::new(registry.clone(), sandbox);

        Self {
            config: Arc::new(config),
            keys,
            issuer: Arc::new(issuer),
            gate: Arc::new(gate),
            registry,
            controller: Arc::new(controller),
        }
    }

    fn create_sandbox(config: &SandboxConfig) -> Result<Arc<dyn SandboxExecutor>, ConfigError> {
        match config.mode {
            SandboxMode::Simulated => {
                info!("Using simulated sandbox");
                Ok(Arc::new(SimulatedSandbox::new()))
            }
            SandboxMode::Process => {
                let program = config.program.as_deref().ok_or_else(|| {
                    ConfigError::Invalid("sandbox.program is required in process mode".to_string())
                })?;
                info!("Using process sandbox running '{}'", program);
                Ok(Arc::new(
                    ProcessSandbox::builder(program)
                        .with_args(config.get_args())
                        .with_timeout(config.timeout())
                        .build(),
                ))
            }
        }
    }
}
