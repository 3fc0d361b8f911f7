pub mod dot_bracket;
pub mod experiments;
pub mod fold;
pub mod timing;
pub mod unfold;

use annealyze::core::io::results::{FsObjectStore, ObjectStore};

fn store_ref(store: &Option<FsObjectStore>) -> Option<&dyn ObjectStore> {
    store.as_ref().map(|s| s as &dyn ObjectStore)
}
