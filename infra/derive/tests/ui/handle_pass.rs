#[strata_derive::handle]
pub struct Registry {
    pub name: String,
    pub capacity: usize,
}

fn main() {
    let registry = Registry::from_inner(RegistryInner { name: "users".to_owned(), capacity: 4 });
    let clone = registry.clone();
    assert_eq!(clone.name, "users");
    assert_eq!(registry.capacity, 4);
    assert_eq!(registry.handle_count(), 2);
}
