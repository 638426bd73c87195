mod comment;
pub use comment::{build_comment_tree, walk, CommentNode, Walk};

mod http;
pub use http::Client;

mod like;
pub use like::{like_state, toggle_like};

mod thread;
pub use thread::CommentThread;

pub mod api {
    pub use withdami_api::*;
}
