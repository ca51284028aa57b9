//! Sharing rules: reading the ACL feed and building default-scope updates.

use crate::codec::{self, child_elements, Binding, FieldMap, Slot};
use crate::error::CalendarError;

/// Role that makes a calendar readable by everyone.
pub const READ_ROLE: &str = "http://schemas.google.com/gCal/2005#read";
/// Role that withdraws public access.
pub const NO_ROLE: &str = "none";

const ACL_XML: &str = r#"<entry xmlns='http://www.w3.org/2005/Atom' xmlns:gAcl='http://schemas.google.com/acl/2007'>
  <category scheme='http://schemas.google.com/g/2005#kind' term='http://schemas.google.com/acl/2007#accessRule'/>
  <gAcl:scope type='default'></gAcl:scope>
  <gAcl:role value=''></gAcl:role>
</entry>"#;

#[derive(Debug, Clone, Copy)]
enum AclField {
    Role,
}

#[derive(Debug, Default)]
struct AclRule {
    role: Option<String>,
}

impl FieldMap for AclRule {
    type Field = AclField;

    fn get(&self, field: AclField) -> Option<String> {
        match field {
            AclField::Role => self.role.clone(),
        }
    }

    fn set(&mut self, field: AclField, value: Option<String>) {
        match field {
            AclField::Role => self.role = value,
        }
    }
}

const ACL_BINDINGS: &[Binding<AclField>] = &[Binding::rw("role", Slot::Attr("value"), AclField::Role)];

/// Default-scope rule document granting or revoking public read access.
pub(crate) fn default_rule(public: bool) -> Result<String, CalendarError> {
    let rule = AclRule {
        role: Some(if public { READ_ROLE } else { NO_ROLE }.to_string()),
    };
    let mut document = codec::parse(ACL_XML)?;
    codec::encode(&mut document, ACL_BINDINGS, &rule);
    codec::write_document(&document)
}

/// Public status according to an ACL feed.
///
/// Looks for a `role` whose preceding sibling is a `scope` of type
/// `default`. `None` when the feed has no such rule.
pub(crate) fn default_scope_public(body: &str) -> Result<Option<bool>, CalendarError> {
    let feed = codec::parse(body)?;
    let mut public = None;

    for entry in child_elements(&feed).filter(|e| e.name == "entry") {
        let mut previous = None;
        for element in child_elements(entry) {
            if element.name == "role" {
                if let Some(scope) = previous.filter(|p: &&xmltree::Element| p.name == "scope") {
                    if scope.attributes.get("type").map(String::as_str) == Some("default") {
                        public = Some(
                            element
                                .attributes
                                .get("value")
                                .is_some_and(|v| v.contains("#read")),
                        );
                    }
                }
            }
            previous = Some(element);
        }
    }

    Ok(public)
}
