pub mod access_gate;
pub mod middleware;
pub mod request_id;

pub use access_gate::{access_gate_middleware, AccessGate, PaymentRequiredResponse};
pub use middleware::{auth_middleware, AuthUser};
pub use request_id::{request_id_middleware, RequestId};
