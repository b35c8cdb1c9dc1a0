pub mod books;

use std::sync::Arc;

use booklist_kernel::ModuleRegistry;

use books::store::BookStore;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, store: Arc<dyn BookStore>) {
    registry.register_custom(books::create_module(store));
}
