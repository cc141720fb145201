/// Static naming of an aggregate, used for table names and UI captions.
pub trait AggregateRoot {
    /// Aggregate index, e.g. "a001"
    fn aggregate_index() -> &'static str;

    /// Collection name used in storage, e.g. "category"
    fn collection_name() -> &'static str;

    /// Singular UI caption
    fn element_name() -> &'static str;

    /// Plural UI caption
    fn list_name() -> &'static str;

    /// Storage table: `{index}_{collection}`
    fn table_name() -> String {
        format!("{}_{}", Self::aggregate_index(), Self::collection_name())
    }
}
