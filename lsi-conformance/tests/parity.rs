use insta::assert_snapshot;
use lsi_conformance::{
    MethodRecord, ParityRecord, each_host, fixture, method_records, parity_records,
};

#[test]
fn test_parity_across_hosts() {
    let mut per_host: Vec<(&'static str, Vec<ParityRecord>)> = Vec::new();
    each_host(fixture::ACCOUNTS, |host, _env| {
        per_host.push((host.name(), parity_records(host)?));
        Ok(())
    })
    .unwrap();

    let hosts: Vec<&str> = per_host.iter().map(|(name, _)| *name).collect();
    assert_eq!(hosts, vec!["macro", "build", "editor"]);

    let (_, expected) = &per_host[0];
    for (host, records) in &per_host[1..] {
        assert_eq!(records, expected, "{} host disagrees with the macro host", host);
    }

    let rendered: Vec<String> = expected.iter().map(ToString::to_string).collect();
    assert_snapshot!(rendered.join("\n"), @r"
    crate::User.id [column] u64
    crate::User.name [] std::string::String
    crate::User.email [] std::option::Option<std::string::String>
    crate::User.roles [] std::vec::Vec<crate::Role>
    crate::User.history [] std::collections::HashMap<std::string::String, crate::audit::Stamp>
    crate::Role.Admin [] crate::Role
    crate::Role.Member [] crate::Role
    crate::Role.Suspended [] crate::Role
    crate::audit::Stamp.at [] i64
    crate::audit::Stamp.by [] crate::User
    ");
}

#[test]
fn test_parity_records_serialize() {
    each_host(fixture::ACCOUNTS, |host, _env| {
        let records = parity_records(host)?;
        let first = serde_json::to_string(&records[0])?;
        assert_eq!(
            first,
            r#"{"class":"crate::User","name":"id","annotations":["column"],"type":"u64"}"#,
            "{} host",
            host.name()
        );
        Ok(())
    })
    .unwrap();
}

#[test]
fn test_method_parity_across_hosts() {
    let mut per_host: Vec<(&'static str, Vec<MethodRecord>)> = Vec::new();
    each_host(fixture::ACCOUNTS, |host, _env| {
        per_host.push((host.name(), method_records(host)?));
        Ok(())
    })
    .unwrap();

    let (_, expected) = &per_host[0];
    for (host, records) in &per_host[1..] {
        assert_eq!(records, expected, "{} host disagrees with the macro host", host);
    }

    let rendered: Vec<String> = expected.iter().map(ToString::to_string).collect();
    assert_snapshot!(rendered.join("\n"), @r"
    crate::User::new [] (id: u64, name: std::string::String) -> crate::User
    crate::User::display_name [must_use] (&self) -> &str
    crate::User::grant [] (&mut self, role: crate::Role) -> ()
    ");
}
