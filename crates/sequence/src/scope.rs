/// Key under which a counter is stored.
///
/// There is one global order-number counter and one counter per product
/// category code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CounterScope {
    /// Global order numbers.
    Orders,

    /// Product codes within one category.
    ProductCategory(String),
}

impl CounterScope {
    /// Creates a product category scope, normalizing the code to trimmed upper case.
    pub fn product_category(category: impl AsRef<str>) -> Self {
        Self::ProductCategory(category.as_ref().trim().to_uppercase())
    }

    /// Returns the storage key for this scope.
    pub fn key(&self) -> String {
        match self {
            CounterScope::Orders => "orders".to_string(),
            CounterScope::ProductCategory(code) => format!("product:{code}"),
        }
    }
}

impl std::fmt::Display for CounterScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}
