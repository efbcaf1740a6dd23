mod errors;
pub use errors::TransportError;

mod transport;
pub use transport::Transport;

mod http;
pub use http::HttpTransport;

mod local;
pub use local::{LocalTransport, UploadedResult};

mod util;
pub use util::{is_remote_url, local_path};
