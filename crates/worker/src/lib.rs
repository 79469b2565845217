pub mod credentials;
pub mod executors;
pub mod git_transport;
pub mod preflight;


pub use credentials::{CredentialResolver, PreparedCredential, GIT_SSH_COMMAND};
pub use executors::MirrorTransferExecutor;
pub use git_transport::{GitTransport, PushMode, PUSH_MODE_OPTION};
pub use preflight::PreflightValidator;
