use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct LdapAttribute {
    pub name: String,
    pub values: Vec<String>,
}

/// A directory entry as returned by a search. Attribute names are matched
/// case-insensitively, values keep the order the server sent them in.
#[derive(Debug, Clone, PartialEq)]
pub struct LdapEntry {
    pub dn: String,
    pub attributes: HashMap<String, LdapAttribute>,
}

impl LdapEntry {
    pub fn new(dn: String) -> Self {
        Self {
            dn,
            attributes: HashMap::new(),
        }
    }

    pub fn add_attribute(&mut self, name: String, values: Vec<String>) {
        self.attributes
            .insert(name.to_lowercase(), LdapAttribute { name, values });
    }

    pub fn get_attribute(&self, name: &str) -> Option<&LdapAttribute> {
        self.attributes.get(&name.to_lowercase())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(&name.to_lowercase())
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<LdapAttribute> {
        self.attributes.remove(&name.to_lowercase())
    }

    /// All values of an attribute, empty when the attribute is absent.
    pub fn values(&self, name: &str) -> &[String] {
        self.get_attribute(name)
            .map(|attr| attr.values.as_slice())
            .unwrap_or(&[])
    }

    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.values(name).first().map(String::as_str)
    }

    pub fn matches_dn(&self, dn: &str) -> bool {
        self.dn.eq_ignore_ascii_case(dn)
    }

    /// Copy restricted to the requested attributes; `*` or an empty list keeps everything.
    pub fn select(&self, attributes: &[&str]) -> LdapEntry {
        if attributes.is_empty() || attributes.contains(&"*") {
            return self.clone();
        }
        let mut selected = LdapEntry::new(self.dn.clone());
        for name in attributes {
            if let Some(attr) = self.get_attribute(name) {
                selected.add_attribute(attr.name.clone(), attr.values.clone());
            }
        }
        selected
    }
}

impl From<ldap3::SearchEntry> for LdapEntry {
    fn from(search_entry: ldap3::SearchEntry) -> Self {
        let mut entry = LdapEntry::new(search_entry.dn);
        for (name, values) in search_entry.attrs {
            entry.add_attribute(name, values);
        }
        entry
    }
}
