//! Dotted field paths over documents.

use mongodb::bson::{Bson, Document};

/// Every value reachable at `path`, descending into arrays along the way
pub fn lookup<'a>(document: &'a Document, path: &str) -> Vec<&'a Bson> {
    let mut current: Vec<&'a Bson> = Vec::new();
    let mut segments = path.split('.');

    let Some(first) = segments.next() else {
        return current;
    };
    if let Some(value) = document.get(first) {
        current.push(value);
    }

    for segment in segments {
        let mut next = Vec::new();
        for value in current {
            match value {
                Bson::Document(inner) => {
                    if let Some(found) = inner.get(segment) {
                        next.push(found);
                    }
                }
                Bson::Array(items) => {
                    if let Ok(position) = segment.parse::<usize>() {
                        if let Some(found) = items.get(position) {
                            next.push(found);
                        }
                    }
                    for item in items {
                        if let Bson::Document(inner) = item {
                            if let Some(found) = inner.get(segment) {
                                next.push(found);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        current = next;
    }

    current
}

/// First value at `path`, without array traversal
pub fn get<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut value = document.get(segments.next()?)?;
    for segment in segments {
        value = match value {
            Bson::Document(inner) => inner.get(segment)?,
            _ => return None,
        };
    }
    Some(value)
}

/// Set `path`, creating intermediate documents; fails if a non-document is in the way
pub fn set(document: &mut Document, path: &str, value: Bson) -> Result<(), String> {
    match path.split_once('.') {
        None => {
            document.insert(path, value);
            Ok(())
        }
        Some((head, rest)) => {
            if !document.contains_key(head) {
                document.insert(head, Document::new());
            }
            match document.get_mut(head) {
                Some(Bson::Document(inner)) => set(inner, rest, value),
                _ => Err(format!(
                    "Cannot create field '{}' in element {{{}: ...}}",
                    rest, head
                )),
            }
        }
    }
}

/// Remove `path` if present
pub fn remove(document: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            document.remove(path);
        }
        Some((head, rest)) => {
            if let Some(Bson::Document(inner)) = document.get_mut(head) {
                remove(inner, rest);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn test_lookup_through_arrays() {
        let document = doc! {
            "address": { "city": "Hanoi" },
            "orders": [ { "sku": "a" }, { "sku": "b" } ],
        };
        assert_eq!(lookup(&document, "address.city"), vec![&Bson::String("Hanoi".into())]);
        assert_eq!(lookup(&document, "orders.sku").len(), 2);
        assert_eq!(lookup(&document, "orders.1.sku"), vec![&Bson::String("b".into())]);
        assert!(lookup(&document, "missing.path").is_empty());
    }

    #[test]
    fn test_set_and_remove_nested() {
        let mut document = doc! { "a": 1 };
        set(&mut document, "profile.name", Bson::String("x".into())).unwrap();
        assert_eq!(get(&document, "profile.name"), Some(&Bson::String("x".into())));

        assert!(set(&mut document, "a.b", Bson::Int32(1)).is_err());

        remove(&mut document, "profile.name");
        assert_eq!(document, doc! { "a": 1, "profile": {} });
    }
}
