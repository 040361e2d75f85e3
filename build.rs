//! Resolves the node's build-time configuration.
//!
//! Every `BEENODE_*` variable is read from the build environment, given its
//! default, validated, and re-exported with `cargo:rustc-env` so the firmware
//! can read it with `env!`.  A malformed numeric value fails the build rather
//! than producing a node that cannot be addressed.

const STRING_VARS: &[(&str, &str)] = &[
    ("BEENODE_BNN", "BN0"),
    ("BEENODE_WIFI_SSID", ""),
    ("BEENODE_WIFI_PSW", ""),
    ("BEENODE_MQTT_SERVER", "maqiatto.com"),
    ("BEENODE_MQTT_USER", ""),
    ("BEENODE_MQTT_PSW", ""),
];

const NUMERIC_VARS: &[(&str, &str)] = &[
    ("BEENODE_DEVICE_NUMBER", "1"),
    ("BEENODE_NETWORK_SIZE", "1"),
    ("BEENODE_MQTT_PORT", "1883"),
];

fn var_or(name: &str, default: &str) -> String {
    println!("cargo:rerun-if-env-changed={name}");
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn main() {
    let mut resolved = Vec::new();

    for (name, default) in STRING_VARS {
        resolved.push((*name, var_or(name, default)));
    }

    for (name, default) in NUMERIC_VARS {
        let value = var_or(name, default);
        if value.trim().parse::<u16>().is_err() {
            panic!("{name}={value:?} is not a valid unsigned 16-bit number");
        }
        resolved.push((*name, value.trim().to_string()));
    }

    if std::env::var("BEENODE_DEVICE_NUMBER").is_err() {
        println!("cargo:warning=BEENODE_DEVICE_NUMBER not set (assuming 1)");
    }

    // The host tool always builds the prefix as `<user>/<BNN>/`.
    let lookup = |key: &str| {
        resolved
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    };
    let derived_prefix = format!(
        "{}/{}/",
        lookup("BEENODE_MQTT_USER"),
        lookup("BEENODE_BNN")
    );
    resolved.push(("BEENODE_TOPIC_PREFIX", var_or("BEENODE_TOPIC_PREFIX", &derived_prefix)));

    let debug = var_or("BEENODE_DEBUG", "0");
    let debug = matches!(debug.trim(), "1" | "true" | "yes" | "on");
    resolved.push(("BEENODE_DEBUG", if debug { "1" } else { "0" }.to_string()));

    for (name, value) in &resolved {
        println!("cargo:rustc-env={name}={value}");
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
