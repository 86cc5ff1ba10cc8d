//! Crate-wide helper macros

/// Builds `ValidationErrors` from a field -> [code => message] map.
///
/// ```ignore
/// validation_errors!({"name": ["name" => "Auto type with this name already exists"]})
/// ```
#[macro_export]
macro_rules! validation_errors {
    ({$($field:tt: [$($code:expr => $message:expr),+]),*}) => {{
        let mut errors = ::validator::ValidationErrors::new();
        $($(
            errors.add(
                $field,
                ::validator::ValidationError {
                    code: ::std::borrow::Cow::from($code),
                    message: Some(::std::borrow::Cow::from($message)),
                    params: ::std::collections::HashMap::new(),
                },
            );
        )+)*
        errors
    }};
}

/// Implements string conversions and the diesel `VarChar` mapping for a fieldless enum.
#[macro_export]
macro_rules! text_enum_sql {
    ($name:ident { $($variant:ident => $text:expr),+ $(,)* }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match *self {
                    $($name::$variant => $text,)+
                }
            }

            pub fn variants() -> Vec<$name> {
                vec![$($name::$variant),+]
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s == $text {
                        return Ok($name::$variant);
                    }
                )+
                Err(format!("Unknown {} value: {}", stringify!($name), s))
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl ::diesel::serialize::ToSql<::diesel::sql_types::VarChar, ::diesel::pg::Pg> for $name {
            fn to_sql<W: ::std::io::Write>(
                &self,
                out: &mut ::diesel::serialize::Output<W, ::diesel::pg::Pg>,
            ) -> ::diesel::serialize::Result {
                ::std::io::Write::write_all(out, self.as_str().as_bytes())?;
                Ok(::diesel::serialize::IsNull::No)
            }
        }

        impl ::diesel::deserialize::FromSql<::diesel::sql_types::VarChar, ::diesel::pg::Pg> for $name {
            fn from_sql(bytes: Option<&[u8]>) -> ::diesel::deserialize::Result<Self> {
                let text = <String as ::diesel::deserialize::FromSql<::diesel::sql_types::VarChar, ::diesel::pg::Pg>>::from_sql(bytes)?;
                text.parse::<$name>().map_err(|e| e.into())
            }
        }
    };
}
