pub mod store_entry;

pub mod prelude {
    pub use super::store_entry::Entity as StoreEntries;
}
