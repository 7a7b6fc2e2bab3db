use shelf_kernel::schema::{FieldRule, Schema};

/// The book record shape. Built once at startup and shared by create and
/// update validation.
pub fn book_schema() -> Schema {
    Schema::new("book")
        .field(FieldRule::string("isbn").required())
        .field(FieldRule::string("amazon_url").required())
        .field(FieldRule::string("author").required())
        .field(FieldRule::string("language").required())
        .field(FieldRule::integer("pages").required().minimum(0))
        .field(FieldRule::string("publisher").required())
        .field(FieldRule::string("title").required())
        .field(FieldRule::integer("year").required())
}
