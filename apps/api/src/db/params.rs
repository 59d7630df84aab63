use serde_json::{Map, Value};

use crate::errors::DataAccessError;

/// Named query parameters, e.g. `{"limit": 500, "offset": 0}`.
pub type QueryParams = Map<String, Value>;

/// A query rewritten from `:name` placeholders to Postgres `$n` placeholders,
/// with its bind values in positional order.
#[derive(Debug, PartialEq)]
pub struct CompiledQuery<'p> {
    pub sql: String,
    pub binds: Vec<&'p Value>,
}

/// Rewrites `:name` placeholders to `$1..$n`.
///
/// `::type` casts and anything inside single-quoted literals or double-quoted
/// identifiers are copied through untouched. A name used more than once is
/// bound once and reuses its position.
pub fn compile_named<'p>(
    sql: &str,
    params: &'p QueryParams,
) -> Result<CompiledQuery<'p>, DataAccessError> {
    let mut out = String::with_capacity(sql.len());
    let mut names: Vec<&str> = Vec::new();
    let mut binds: Vec<&'p Value> = Vec::new();
    let mut chars = sql.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '\'' | '"' => {
                out.push(c);
                for (_, inner) in chars.by_ref() {
                    out.push(inner);
                    if inner == c {
                        break;
                    }
                }
            }
            ':' => match chars.peek() {
                Some((_, ':')) => {
                    out.push_str("::");
                    chars.next();
                }
                Some((_, next)) if next.is_ascii_alphabetic() || *next == '_' => {
                    let start = i + 1;
                    let mut end = start;
                    while let Some((j, n)) = chars.peek() {
                        if n.is_ascii_alphanumeric() || *n == '_' {
                            end = j + n.len_utf8();
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    let name = &sql[start..end];
                    let position = match names.iter().position(|known| *known == name) {
                        Some(existing) => existing + 1,
                        None => {
                            let value = params
                                .get(name)
                                .ok_or_else(|| DataAccessError::MissingParameter(name.to_string()))?;
                            names.push(name);
                            binds.push(value);
                            binds.len()
                        }
                    };
                    out.push('$');
                    out.push_str(&position.to_string());
                }
                _ => out.push(c),
            },
            _ => out.push(c),
        }
    }

    Ok(CompiledQuery { sql: out, binds })
}
