use super::scanner::DeprecationReport;
use crate::directory::LdapEntry;
use std::fmt::Write;

/// LDIF modify records deleting every deprecated attribute each entry holds.
pub fn removal_ldif(report: &DeprecationReport, entries: &[LdapEntry]) -> String {
    let mut ldif = String::new();
    for entry in entries {
        let _ = writeln!(ldif, "dn:{}", entry.dn);
        ldif.push_str("changetype:modify\n");
        for attribute in report.attributes.iter().filter_map(|a| a.name.as_deref()) {
            if entry.has_attribute(attribute) {
                let _ = writeln!(ldif, "delete:{}\n-", attribute);
            }
        }
        ldif.push('\n');
    }
    ldif
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deprecation::scan;

    #[test]
    fn test_removal_ldif() {
        let report = scan(
            &[
                "( 1.2.1 NAME 'gosaSubtreeACL' OBSOLETE )",
                "( 1.2.2 NAME 'gosaMailQuota' OBSOLETE )",
            ],
            &[] as &[&str],
        );

        let mut user = LdapEntry::new("uid=jdoe,ou=people,dc=example,dc=org".to_string());
        user.add_attribute("uid".to_string(), vec!["jdoe".to_string()]);
        user.add_attribute("gosamailquota".to_string(), vec!["1024".to_string()]);
        let mut admin = LdapEntry::new("cn=admin,dc=example,dc=org".to_string());
        admin.add_attribute("gosaSubtreeACL".to_string(), vec!["acl".to_string()]);
        admin.add_attribute("gosaMailQuota".to_string(), vec!["1".to_string()]);

        assert_eq!(
            removal_ldif(&report, &[user, admin]),
            "dn:uid=jdoe,ou=people,dc=example,dc=org\n\
             changetype:modify\n\
             delete:gosaMailQuota\n\
             -\n\
             \n\
             dn:cn=admin,dc=example,dc=org\n\
             changetype:modify\n\
             delete:gosaSubtreeACL\n\
             -\n\
             delete:gosaMailQuota\n\
             -\n\
             \n"
        );
    }

    #[test]
    fn test_removal_ldif_without_entries() {
        let report = scan(&["( 1.2.1 NAME 'old' OBSOLETE )"], &[] as &[&str]);
        assert!(removal_ldif(&report, &[]).is_empty());
    }
}
