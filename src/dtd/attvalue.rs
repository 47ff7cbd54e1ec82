//! Attribute value validation and normalization (spec §4.E "Attribute value
//! validation").

use super::{AttType, AttributeDecl, DefaultKind, Dtd};
use crate::chars::{collapse_whitespace, is_name_char, is_name_start_char, trim};
use crate::error::ValidityError;

impl AttributeDecl {
    /// Validates and re-formats `raw` per this declaration's type,
    /// returning the normalized value or the validity error to report.
    pub fn normalize(&self, element: &str, raw: &str, dtd: &Dtd) -> Result<String, ValidityError> {
        let normalized = match &self.att_type {
            AttType::CData => raw.to_string(),
            AttType::NmToken => {
                let v = trim(raw);
                if v.is_empty() || !v.chars().all(is_name_char) {
                    return Err(bad(element, &self.name, raw));
                }
                v.to_string()
            }
            AttType::NmTokens => {
                let v = collapse_whitespace(raw);
                if v.is_empty() || !v.split(' ').all(|t| !t.is_empty() && t.chars().all(is_name_char)) {
                    return Err(bad(element, &self.name, raw));
                }
                v
            }
            AttType::Id | AttType::IdRef => {
                let v = trim(raw);
                if !is_valid_name(v) {
                    return Err(bad(element, &self.name, raw));
                }
                v.to_string()
            }
            AttType::IdRefs | AttType::Entities => {
                let v = collapse_whitespace(raw);
                if v.is_empty() || !v.split(' ').all(is_valid_name) {
                    return Err(bad(element, &self.name, raw));
                }
                if matches!(self.att_type, AttType::Entities) {
                    for name in v.split(' ') {
                        if !dtd.general_entities.get(name).map(|e| e.ndata.is_some()).unwrap_or(false) {
                            return Err(bad(element, &self.name, raw));
                        }
                    }
                }
                v
            }
            AttType::Entity => {
                let v = trim(raw);
                if !is_valid_name(v) || !dtd.general_entities.get(v).map(|e| e.ndata.is_some()).unwrap_or(false) {
                    return Err(bad(element, &self.name, raw));
                }
                v.to_string()
            }
            AttType::Enumerated(values) | AttType::Notation(values) => {
                let v = trim(raw);
                if !values.iter().any(|c| c == v) {
                    return Err(bad(element, &self.name, raw));
                }
                v.to_string()
            }
        };

        if self.default_kind == DefaultKind::Fixed {
            if let Some(expected) = &self.default_value {
                if expected != &normalized {
                    return Err(ValidityError::FixedAttributeMismatch {
                        element: element.to_string(),
                        attribute: self.name.clone(),
                        expected: expected.clone(),
                        actual: normalized,
                    });
                }
            }
        }

        Ok(normalized)
    }
}

fn bad(element: &str, attribute: &str, value: &str) -> ValidityError {
    ValidityError::InvalidAttributeValue {
        element: element.to_string(),
        attribute: attribute.to_string(),
        value: value.to_string(),
    }
}

fn is_valid_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_name_start_char(c) => {}
        _ => return false,
    }
    chars.all(is_name_char)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(att_type: AttType, default_kind: DefaultKind, default_value: Option<&str>) -> AttributeDecl {
        AttributeDecl {
            name: "a".into(),
            att_type,
            default_kind,
            default_value: default_value.map(str::to_string),
            external: false,
        }
    }

    #[test]
    fn nmtokens_collapse_internal_runs() {
        let d = decl(AttType::NmTokens, DefaultKind::None, None);
        let dtd = Dtd::default();
        assert_eq!(d.normalize("e", "  foo   bar ", &dtd).unwrap(), "foo bar");
    }

    #[test]
    fn id_rejects_leading_digit() {
        let d = decl(AttType::Id, DefaultKind::None, None);
        let dtd = Dtd::default();
        assert!(d.normalize("e", "1bad", &dtd).is_err());
        assert!(d.normalize("e", "good1", &dtd).is_ok());
    }

    #[test]
    fn fixed_value_mismatch_is_reported() {
        let d = decl(AttType::CData, DefaultKind::Fixed, Some("x"));
        let dtd = Dtd::default();
        assert!(d.normalize("e", "y", &dtd).is_err());
        assert!(d.normalize("e", "x", &dtd).is_ok());
    }

    #[test]
    fn enumerated_checks_membership() {
        let d = decl(AttType::Enumerated(vec!["a".into(), "b".into()]), DefaultKind::None, None);
        let dtd = Dtd::default();
        assert!(d.normalize("e", "a", &dtd).is_ok());
        assert!(d.normalize("e", "c", &dtd).is_err());
    }
}
