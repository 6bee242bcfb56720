//! The `{...}` text form of arrays.
//!
//! Formatting quotes any element that is empty, spells `NULL`, or contains a
//! delimiter, quote, backslash or whitespace. Parsing accepts an optional
//! `[lb:ub]...=` dimension decoration.

use crate::any::{flatten_list, infer_value_shape, value_into_array};
use crate::codecs::{ElementCodec, TypeRegistry};
use crate::error::{ArrayError, ArrayResult};
use crate::shape::{infer_shape, Nested};
use crate::types::{Oid, Value};

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Render a dynamic value; `None` for the absent array, which has no literal.
pub fn format_text(
    value: &Value,
    element_oid: Oid,
    registry: &TypeRegistry,
) -> ArrayResult<Option<String>> {
    let items = match value {
        Value::Null => return Ok(None),
        Value::List(items) => items,
        other => {
            return Err(ArrayError::TypeMismatch {
                expected: crate::types::ElementType::Array,
                found: other.type_name(),
            });
        }
    };
    let codec = registry.lookup(element_oid)?;
    let (lengths, elements) = flatten_list(items, codec, registry)?;
    write_text(&lengths, &elements, codec, registry).map(Some)
}

/// Render a native nested container; `None` for the absent array.
pub fn encode_text_array<T: Nested>(
    value: Option<&[T]>,
    element_oid: Oid,
    registry: &TypeRegistry,
) -> ArrayResult<Option<String>> {
    let Some(items) = value else {
        return Ok(None);
    };
    let shape = infer_shape(items, registry.options().max_dimensions)?;
    let mut elements = Vec::with_capacity(shape.element_count());
    for item in items {
        item.flatten_into(&mut elements);
    }
    let codec = registry.lookup(element_oid)?;
    write_text(&shape.lengths, &elements, codec, registry).map(Some)
}

fn write_text(
    lengths: &[usize],
    elements: &[Option<Value>],
    codec: &ElementCodec,
    registry: &TypeRegistry,
) -> ArrayResult<String> {
    let mut out = String::new();
    if lengths.contains(&0) {
        out.push_str("{}");
        return Ok(out);
    }
    let mut iter = elements.iter();
    write_level(&mut out, lengths, &mut iter, codec, registry)?;
    Ok(out)
}

fn write_level(
    out: &mut String,
    lengths: &[usize],
    iter: &mut std::slice::Iter<'_, Option<Value>>,
    codec: &ElementCodec,
    registry: &TypeRegistry,
) -> ArrayResult<()> {
    let Some((len, rest)) = lengths.split_first() else {
        return Ok(());
    };
    out.push('{');
    for i in 0..*len {
        if i > 0 {
            out.push(',');
        }
        if !rest.is_empty() {
            write_level(out, rest, iter, codec, registry)?;
            continue;
        }
        match iter.next() {
            Some(Some(v)) => push_quoted(out, &codec.encode_text(registry, v)?),
            Some(None) => out.push_str("NULL"),
            None => {
                return Err(ArrayError::Encode(
                    "fewer elements than the dimensions describe".into(),
                ));
            }
        }
    }
    out.push('}');
    Ok(())
}

fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s.eq_ignore_ascii_case("NULL")
        || s
            .chars()
            .any(|c| matches!(c, '{' | '}' | ',' | '"' | '\\') || c.is_ascii_whitespace())
}

fn push_quoted(out: &mut String, s: &str) {
    if !needs_quotes(s) {
        out.push_str(s);
        return;
    }
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

enum Node {
    List(Vec<Node>),
    /// `verbatim` is false when the element was quoted or escaped, so it can
    /// never be the NULL marker.
    Item { text: String, verbatim: bool },
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    max_dimensions: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, max_dimensions: usize) -> Self {
        Self {
            input,
            pos: 0,
            max_dimensions,
        }
    }

    fn error(&self, message: impl Into<String>) -> ArrayError {
        ArrayError::TextSyntax {
            position: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, want: char) -> ArrayResult<()> {
        match self.peek() {
            Some(c) if c == want => {
                self.pos += c.len_utf8();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{want}', found '{c}'"))),
            None => Err(self.error(format!("expected '{want}', found end of input"))),
        }
    }

    fn bounds(&mut self) -> ArrayResult<Vec<(i32, i32)>> {
        let mut bounds = Vec::new();
        while self.peek() == Some('[') {
            self.pos += 1;
            let lower = self.integer()?;
            self.expect(':')?;
            let upper = self.integer()?;
            self.expect(']')?;
            bounds.push((lower, upper));
            self.skip_whitespace();
        }
        if !bounds.is_empty() {
            self.expect('=')?;
            self.skip_whitespace();
        }
        Ok(bounds)
    }

    fn integer(&mut self) -> ArrayResult<i32> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        self.input[start..self.pos]
            .parse()
            .map_err(|_| self.error("invalid dimension bound"))
    }

    /// `depth` is the number of enclosing lists.
    fn list(&mut self, depth: usize) -> ArrayResult<Node> {
        if depth >= self.max_dimensions {
            return Err(ArrayError::TooManyDimensions {
                ndims: depth + 1,
                max: self.max_dimensions,
            });
        }
        self.expect('{')?;
        self.skip_whitespace();
        let mut children = Vec::new();
        if self.peek() == Some('}') {
            self.pos += 1;
            return Ok(Node::List(children));
        }
        loop {
            self.skip_whitespace();
            let child = match self.peek() {
                Some('{') => self.list(depth + 1)?,
                Some(_) => self.item()?,
                None => return Err(self.error("unexpected end of input")),
            };
            children.push(child);
            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                Some('}') => break,
                Some(c) => return Err(self.error(format!("unexpected '{c}'"))),
                None => return Err(self.error("unexpected end of input")),
            }
        }
        Ok(Node::List(children))
    }

    fn item(&mut self) -> ArrayResult<Node> {
        if self.peek() == Some('"') {
            self.pos += 1;
            let mut text = String::new();
            loop {
                match self.bump() {
                    Some('"') => break,
                    Some('\\') => match self.bump() {
                        Some(c) => text.push(c),
                        None => return Err(self.error("unterminated escape")),
                    },
                    Some(c) => text.push(c),
                    None => return Err(self.error("unterminated quoted element")),
                }
            }
            return Ok(Node::Item {
                text,
                verbatim: false,
            });
        }

        let mut text = String::new();
        let mut verbatim = true;
        // Whitespace is kept only when something non-blank follows it.
        let mut pending_space = String::new();
        while let Some(c) = self.peek() {
            match c {
                ',' | '}' => break,
                '{' | '"' => return Err(self.error(format!("unexpected '{c}'"))),
                '\\' => {
                    self.pos += 1;
                    let escaped = self
                        .bump()
                        .ok_or_else(|| self.error("unterminated escape"))?;
                    text.push_str(&pending_space);
                    pending_space.clear();
                    text.push(escaped);
                    verbatim = false;
                }
                c if c.is_ascii_whitespace() => {
                    self.pos += 1;
                    pending_space.push(c);
                }
                c => {
                    self.pos += c.len_utf8();
                    text.push_str(&pending_space);
                    pending_space.clear();
                    text.push(c);
                }
            }
        }
        if text.is_empty() && verbatim {
            return Err(self.error("empty array element"));
        }
        Ok(Node::Item { text, verbatim })
    }
}

fn node_to_value(
    node: Node,
    depth: usize,
    codec: &ElementCodec,
    registry: &TypeRegistry,
) -> ArrayResult<Value> {
    match node {
        Node::List(children) => {
            if depth > 0 && matches!(codec, ElementCodec::Array(_)) {
                return Err(ArrayError::TextSyntax {
                    position: 0,
                    message: "array-valued elements must be quoted".into(),
                });
            }
            children
                .into_iter()
                .map(|child| node_to_value(child, depth + 1, codec, registry))
                .collect::<ArrayResult<Vec<_>>>()
                .map(Value::List)
        }
        Node::Item { text, verbatim } if verbatim && text.eq_ignore_ascii_case("NULL") => {
            Ok(Value::Null)
        }
        Node::Item { text, .. } => codec.decode_text(registry, &text),
    }
}

/// Parse an array literal into a dynamic `Value::List`.
pub fn parse_text(input: &str, element_oid: Oid, registry: &TypeRegistry) -> ArrayResult<Value> {
    let codec = registry.lookup(element_oid)?;

    let mut parser = Parser::new(input, registry.options().max_dimensions);
    parser.skip_whitespace();
    let bounds = parser.bounds()?;
    let root = parser.list(0)?;
    parser.skip_whitespace();
    if parser.pos != input.len() {
        return Err(parser.error("junk after closing right brace"));
    }

    let value = node_to_value(root, 0, codec, registry)?;
    let items = value.as_list().unwrap_or_default();
    let lengths = if matches!(codec, ElementCodec::Array(_)) {
        vec![items.len()]
    } else {
        infer_value_shape(items, registry.options().max_dimensions)?
    };

    if !bounds.is_empty() {
        let matches = bounds.len() == lengths.len()
            && bounds
                .iter()
                .zip(&lengths)
                .all(|(&(lower, upper), &len)| {
                    i64::from(upper) - i64::from(lower) + 1 == len as i64
                });
        if !matches {
            return Err(ArrayError::TextSyntax {
                position: 0,
                message: format!(
                    "dimension decoration {bounds:?} does not match array lengths {lengths:?}"
                ),
            });
        }
    }

    Ok(value)
}

/// Parse an array literal into a native nested container.
pub fn decode_text_array<T: Nested>(
    input: &str,
    element_oid: Oid,
    registry: &TypeRegistry,
) -> ArrayResult<Vec<T>> {
    let value = parse_text(input, element_oid, registry)?;
    Ok(value_into_array(&value, registry)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::oid;

    fn reg() -> TypeRegistry {
        TypeRegistry::default()
    }

    #[test]
    fn format_nested_ints() {
        let v = vec![vec![1i32, 2], vec![3, 4]];
        let s = encode_text_array(Some(&v[..]), oid::INT4, &reg()).unwrap();
        assert_eq!(s.as_deref(), Some("{{1,2},{3,4}}"));
    }

    #[test]
    fn format_quotes_and_nulls() {
        let v = vec![
            Some("a b".to_string()),
            None,
            Some("null".to_string()),
            Some(String::new()),
            Some("say \"hi\"".to_string()),
            Some("plain".to_string()),
        ];
        let s = encode_text_array(Some(&v[..]), oid::TEXT, &reg()).unwrap().unwrap();
        assert_eq!(s, r#"{"a b",NULL,"null","","say \"hi\"",plain}"#);
    }

    #[test]
    fn format_absent_and_empty() {
        assert_eq!(format_text(&Value::Null, oid::INT4, &reg()).unwrap(), None);
        assert_eq!(
            format_text(&Value::List(vec![]), oid::INT4, &reg()).unwrap().as_deref(),
            Some("{}")
        );
    }

    #[test]
    fn parse_two_dimensions() {
        let v: Vec<Vec<i32>> = decode_text_array(
            "{{1,2,3,4}, {5,6,7,8}, {9,10,11,12}}",
            oid::INT4,
            &reg(),
        )
        .unwrap();
        assert_eq!(
            v,
            vec![vec![1, 2, 3, 4], vec![5, 6, 7, 8], vec![9, 10, 11, 12]]
        );
    }

    #[test]
    fn parse_null_and_quoted_null() {
        let v = parse_text(r#"{NULL, "NULL", nUlL}"#, oid::TEXT, &reg()).unwrap();
        assert_eq!(
            v,
            Value::List(vec![Value::Null, Value::from("NULL"), Value::Null])
        );
    }

    #[test]
    fn parse_escapes_and_inner_whitespace() {
        let v = parse_text(r#"{ foo bar , "a\"b", c\,d }"#, oid::TEXT, &reg()).unwrap();
        assert_eq!(
            v,
            Value::List(vec![
                Value::from("foo bar"),
                Value::from("a\"b"),
                Value::from("c,d"),
            ])
        );
    }

    #[test]
    fn parse_with_bounds() {
        let v = parse_text("[0:1][-1:0]={{1,2},{3,4}}", oid::INT2, &reg()).unwrap();
        assert_eq!(v, Value::from(vec![vec![1i16, 2], vec![3, 4]]));
        assert!(matches!(
            parse_text("[1:3]={1,2}", oid::INT2, &reg()),
            Err(ArrayError::TextSyntax { .. })
        ));
    }

    #[test]
    fn parse_empty() {
        assert_eq!(
            parse_text(" {} ", oid::INT4, &reg()).unwrap(),
            Value::List(vec![])
        );
        let v: Vec<Vec<i32>> = decode_text_array("{}", oid::INT4, &reg()).unwrap();
        assert!(v.is_empty());
    }

    #[test]
    fn parse_ragged() {
        assert!(matches!(
            parse_text("{{1,2},{3}}", oid::INT4, &reg()),
            Err(ArrayError::RaggedShape { .. })
        ));
        assert!(matches!(
            parse_text("{1,{2}}", oid::INT4, &reg()),
            Err(ArrayError::TextSyntax { .. }) | Err(ArrayError::RaggedShape { .. })
        ));
    }

    #[test]
    fn parse_syntax_errors() {
        for bad in ["{1,2", "{1,,2}", "{1,2}x", "1,2", "{\"abc}"] {
            assert!(
                matches!(
                    parse_text(bad, oid::INT4, &reg()),
                    Err(ArrayError::TextSyntax { .. })
                ),
                "{bad} should fail"
            );
        }
    }

    #[test]
    fn text_and_binary_agree() {
        let r = reg();
        let parsed = parse_text("{{true,NULL},{f,t}}", oid::BOOL, &r).unwrap();
        let encoded = crate::any::encode_any(&parsed, oid::BOOL, &r).unwrap();
        assert_eq!(crate::any::decode_any(&encoded, &r).unwrap(), parsed);
        assert_eq!(
            format_text(&parsed, oid::BOOL, &r).unwrap().as_deref(),
            Some("{{t,NULL},{f,t}}")
        );
    }

    #[test]
    fn array_valued_elements_are_quoted() {
        let r = reg();
        let v = Value::List(vec![Value::from(vec![1i32, 2]), Value::Null]);
        let s = format_text(&v, oid::INT4_ARRAY, &r).unwrap().unwrap();
        assert_eq!(s, r#"{"{1,2}",NULL}"#);
        assert_eq!(parse_text(&s, oid::INT4_ARRAY, &r).unwrap(), v);
    }

    #[test]
    fn deep_nesting_stops_at_dimension_limit() {
        let input = "{".repeat(2000) + &"}".repeat(2000);
        assert!(matches!(
            parse_text(&input, oid::INT4, &reg()),
            Err(ArrayError::TooManyDimensions { ndims: 7, max: 6 })
        ));

        let six = "{".repeat(6) + "1" + &"}".repeat(6);
        let v = parse_text(&six, oid::INT4, &reg()).unwrap();
        assert_eq!(infer_value_shape(v.as_list().unwrap(), 6).unwrap(), vec![1; 6]);
    }

    #[test]
    fn bounds_outside_int4_are_rejected() {
        assert!(matches!(
            parse_text(
                "[-9223372036854775808:9223372036854775807]={1}",
                oid::INT4,
                &reg()
            ),
            Err(ArrayError::TextSyntax { .. })
        ));
        assert!(matches!(
            parse_text("[-2147483648:2147483647]={1}", oid::INT4, &reg()),
            Err(ArrayError::TextSyntax { .. })
        ));
        assert!(parse_text("[2147483647:2147483647]={1}", oid::INT4, &reg()).is_ok());
    }
}
