//! Java command-line synthesis from instance paths and configuration.

use std::path::Path;

use crate::config::ConfigStore;

/// Server entry point class, fixed for the 3.x zip distribution.
pub const ENTRY_POINT: &str = "org.neo4j.server.CommunityEntryPoint";

const JVM_ADDITIONAL_KEY: &str = "dbms.jvm.additional";
const HEAP_INITIAL_KEY: &str = "dbms.memory.heap.initial_size";
const HEAP_MAX_KEY: &str = "dbms.memory.heap.max_size";

#[cfg(windows)]
const CLASSPATH_SEPARATOR: char = ';';
#[cfg(not(windows))]
const CLASSPATH_SEPARATOR: char = ':';

/// Build the full argv for launching the server.
///
/// Pure with respect to `config`, and re-derived on every start so
/// configuration changes between stop and restart take effect. Arguments go
/// through the OS argv untouched, so paths with embedded spaces need no
/// quoting here.
pub fn build_java_args(home_dir: &Path, config: &ConfigStore) -> Vec<String> {
    let home = home_dir.display();
    let mut args = vec![
        "-cp".to_string(),
        format!("{home}/lib/*{CLASSPATH_SEPARATOR}{home}/plugins/*"),
        "-server".to_string(),
        "-Dlog4j.configuration=file:conf/log4j.properties".to_string(),
        "-Dorg.neo4j.cluster.logdirectory=data/log".to_string(),
    ];

    // Each repeated dbms.jvm.additional entry is its own argument, verbatim
    // and in file order.
    for entry in config.find_values(JVM_ADDITIONAL_KEY) {
        args.push(entry.value.clone());
    }

    if let Some(initial) = config.get_value(HEAP_INITIAL_KEY) {
        if !initial.is_empty() {
            args.push(format!("-Xms{initial}"));
        }
    }
    if let Some(max) = config.get_value(HEAP_MAX_KEY) {
        if !max.is_empty() {
            args.push(format!("-Xmx{max}"));
        }
    }

    args.push(ENTRY_POINT.to_string());
    args.push(format!("--config-dir={}", home_dir.join("conf").display()));
    args.push(format!("--home-dir={home}"));
    args
}
