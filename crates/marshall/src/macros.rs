/// Define a named mapping type with typed accessors.
///
/// The schema expression is evaluated once, on first use, and shared by every
/// instance. It must produce an `Arc<Schema>`; a schema that fails to build is
/// a programming error, so unwrapping there is the usual choice.
///
/// Each accessor line `getter / setter => "name"` generates
/// `fn getter(&self) -> Result<Option<&str>>` and
/// `fn setter(&mut self, value: impl ToString) -> Result<()>` forwarding to
/// [`Mapping::get`](crate::Mapping::get) and [`Mapping::set`](crate::Mapping::set).
/// The type dereferences to [`Mapping`](crate::Mapping) for everything else.
///
/// ```rust
/// use marshall::{xml_mapping, Schema};
///
/// xml_mapping! {
///     /// A weather data request.
///     #[derive(Debug)]
///     pub struct Request(
///         Schema::builder("Request", "request")
///             .children("request", ["read"])
///             .children("read", ["date"])
///             .unique(["read", "date"])
///             .attributes("read", ["database"])
///             .build()
///             .expect("request schema is valid")
///     ) {
///         database / set_database => "database",
///         date / set_date => "read.date",
///     }
/// }
///
/// let mut request = Request::new();
/// request.set_database("roma").unwrap();
/// request.set_date(2013041600).unwrap();
/// assert_eq!(request.date().unwrap(), Some("2013041600"));
/// assert_eq!(request.count("read").unwrap(), 1);
/// ```
#[macro_export]
macro_rules! xml_mapping {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident($schema:expr) {
            $( $getter:ident / $setter:ident => $field:literal ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name($crate::Mapping);

        #[allow(dead_code)]
        impl $name {
            /// The schema shared by every instance of this type.
            pub fn shared_schema() -> &'static ::std::sync::Arc<$crate::Schema> {
                static SCHEMA: $crate::__private::Lazy<::std::sync::Arc<$crate::Schema>> =
                    $crate::__private::Lazy::new(|| $schema);
                &SCHEMA
            }

            /// An empty document.
            pub fn new() -> Self {
                Self($crate::Mapping::new(::std::sync::Arc::clone(Self::shared_schema())))
            }

            /// Parse XML text.
            pub fn parse(content: &str) -> $crate::Result<Self> {
                $crate::Mapping::parse(::std::sync::Arc::clone(Self::shared_schema()), content).map(Self)
            }

            /// Load an XML file.
            pub fn load(path: impl AsRef<::std::path::Path>) -> $crate::Result<Self> {
                $crate::Mapping::load(::std::sync::Arc::clone(Self::shared_schema()), path).map(Self)
            }

            pub fn into_inner(self) -> $crate::Mapping {
                self.0
            }

            $(
                pub fn $getter(&self) -> $crate::Result<Option<&str>> {
                    self.0.get($field)
                }

                pub fn $setter(&mut self, value: impl ::std::string::ToString) -> $crate::Result<()> {
                    self.0.set($field, value)
                }
            )*
        }

        impl ::std::default::Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl ::std::ops::Deref for $name {
            type Target = $crate::Mapping;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl ::std::ops::DerefMut for $name {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{Error, Schema};

    xml_mapping! {
        #[derive(Debug)]
        struct Contact(
            Schema::builder("Contact", "contact")
                .children("contact", ["name", "phone"])
                .unique(["name"])
                .attributes("contact", ["id"])
                .build()
                .expect("contact schema")
        ) {
            id / set_id => "id",
            name / set_name => "name",
            phone / set_phone => "phone",
        }
    }

    #[test]
    fn test_generated_accessors() {
        let mut contact = Contact::default();
        contact.set_id(12).unwrap();
        contact.set_name("Ada").unwrap();

        assert_eq!(contact.id().unwrap(), Some("12"));
        assert_eq!(contact.name().unwrap(), Some("Ada"));
        assert_eq!(contact.phone().unwrap(), None);
    }

    #[test]
    fn test_schema_is_shared() {
        let first = Contact::new();
        let second = Contact::new();
        assert!(std::sync::Arc::ptr_eq(first.schema(), second.schema()));
        assert!(std::sync::Arc::ptr_eq(first.schema(), Contact::shared_schema()));
    }

    #[test]
    fn test_parse_and_deref() {
        let mut contact =
            Contact::parse("<contact id='3'><phone>1</phone><phone>2</phone></contact>").unwrap();

        assert_eq!(contact.id().unwrap(), Some("3"));
        assert!(matches!(contact.phone(), Err(Error::AmbiguousTag { .. })));

        contact.remove("phone", 0).unwrap();
        assert_eq!(contact.phone().unwrap(), Some("2"));
        assert!(contact.to_string().contains("<phone>2</phone>"));
        assert_eq!(contact.into_inner().count("phone").unwrap(), 1);
    }
}
