//! Static field tables for the compose file formats.
//!
//! One table covers all formats; fields introduced later carry the first
//! [`SchemaVersion`] that accepts them.

use crate::parser::{Node, NodeKind, ScalarValue};
use crate::schema::SchemaVersion;

/// Value kind as seen by the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    String,
    Number,
    Boolean,
    Mapping,
    Sequence,
    Null,
}

impl Kind {
    pub fn of(node: &Node) -> Self {
        match &node.kind {
            NodeKind::Mapping(_) => Self::Mapping,
            NodeKind::Sequence(_) => Self::Sequence,
            NodeKind::Scalar(s) => match s.value {
                ScalarValue::Null => Self::Null,
                ScalarValue::Bool(_) => Self::Boolean,
                ScalarValue::Int(_) | ScalarValue::Float(_) => Self::Number,
                ScalarValue::String(_) => Self::String,
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Mapping => "mapping",
            Self::Sequence => "sequence",
            Self::Null => "null",
        }
    }
}

/// A key that must be present, unless `unless` is set to a value other
/// than `false`.
#[derive(Debug, Clone, Copy)]
pub struct Required {
    pub key: &'static str,
    pub unless: Option<&'static str>,
}

impl Required {
    pub const fn key(key: &'static str) -> Self {
        Self { key, unless: None }
    }

    pub const fn unless(key: &'static str, other: &'static str) -> Self {
        Self {
            key,
            unless: Some(other),
        }
    }
}

/// Expected shape of a value.
#[derive(Debug, Clone, Copy)]
pub struct Spec {
    /// Accepted kinds; empty accepts anything.
    pub types: &'static [Kind],
    /// Known keys of a mapping. Empty means the mapping is free-form.
    pub fields: &'static [Field],
    /// Shape of every value in a free-form mapping (e.g. `services`).
    pub entries: Option<&'static Spec>,
    /// Shape of every sequence item.
    pub items: Option<&'static Spec>,
    /// Allowed string values; a trailing `*` matches a prefix.
    pub allowed: &'static [&'static str],
    pub required: &'static [Required],
}

impl Spec {
    pub const fn any() -> Self {
        Self::of(&[])
    }

    pub const fn of(types: &'static [Kind]) -> Self {
        Self {
            types,
            fields: &[],
            entries: None,
            items: None,
            allowed: &[],
            required: &[],
        }
    }

    pub const fn fields(mut self, fields: &'static [Field]) -> Self {
        self.fields = fields;
        self
    }

    pub const fn entries(mut self, spec: &'static Spec) -> Self {
        self.entries = Some(spec);
        self
    }

    pub const fn items(mut self, spec: &'static Spec) -> Self {
        self.items = Some(spec);
        self
    }

    pub const fn allowed(mut self, values: &'static [&'static str]) -> Self {
        self.allowed = values;
        self
    }

    pub const fn required(mut self, required: &'static [Required]) -> Self {
        self.required = required;
        self
    }

    pub fn accepts(&self, kind: Kind) -> bool {
        self.types.is_empty() || self.types.contains(&kind)
    }

    pub fn field(&self, name: &str) -> Option<&'static Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether `value` is one of the allowed values.
    pub fn allows(&self, value: &str) -> bool {
        self.allowed.iter().any(|allowed| match allowed.strip_suffix('*') {
            Some(prefix) => value.starts_with(prefix),
            None => *allowed == value,
        })
    }
}

/// A known key of a mapping.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    /// First format version that accepts the key.
    pub since: SchemaVersion,
    pub spec: Spec,
}

impl Field {
    pub const fn new(name: &'static str, spec: Spec) -> Self {
        Self {
            name,
            since: SchemaVersion::V2,
            spec,
        }
    }

    pub const fn since(mut self, version: SchemaVersion) -> Self {
        self.since = version;
        self
    }
}

const STR: &[Kind] = &[Kind::String];
const NUM: &[Kind] = &[Kind::Number];
const BOOL: &[Kind] = &[Kind::Boolean];
const MAP: &[Kind] = &[Kind::Mapping];
const SEQ: &[Kind] = &[Kind::Sequence];
const STR_NUM: &[Kind] = &[Kind::String, Kind::Number];
const STR_SEQ: &[Kind] = &[Kind::String, Kind::Sequence];
const STR_MAP: &[Kind] = &[Kind::String, Kind::Mapping];
const MAP_SEQ: &[Kind] = &[Kind::Mapping, Kind::Sequence];
const MAP_NULL: &[Kind] = &[Kind::Mapping, Kind::Null];
const BOOL_MAP: &[Kind] = &[Kind::Boolean, Kind::Mapping];
const PORT_ITEM: &[Kind] = &[Kind::String, Kind::Number, Kind::Mapping];

const fn f(name: &'static str, types: &'static [Kind]) -> Field {
    Field::new(name, Spec::of(types))
}

const fn any(name: &'static str) -> Field {
    Field::new(name, Spec::any())
}

const RESTART_VALUES: &[&str] = &["no", "always", "on-failure", "on-failure:*", "unless-stopped"];
const PULL_POLICY_VALUES: &[&str] = &[
    "always",
    "never",
    "missing",
    "build",
    "if_not_present",
    "daily",
    "weekly",
    "every_*",
];

const PORT_FIELDS: &[Field] = &[
    f("name", STR),
    f("target", STR_NUM),
    f("published", STR_NUM),
    f("host_ip", STR),
    Field::new("protocol", Spec::of(STR).allowed(&["tcp", "udp", "sctp"])),
    Field::new("mode", Spec::of(STR).allowed(&["host", "ingress"])),
    f("app_protocol", STR),
];
const PORT_REQUIRED: &[Required] = &[Required::key("target")];
const PORT: Spec = Spec::of(PORT_ITEM).fields(PORT_FIELDS).required(PORT_REQUIRED);

const BUILD_FIELDS: &[Field] = &[
    f("context", STR),
    f("dockerfile", STR),
    f("dockerfile_inline", STR),
    f("args", MAP_SEQ),
    f("ssh", MAP_SEQ),
    f("cache_from", SEQ),
    f("cache_to", SEQ),
    f("additional_contexts", MAP_SEQ),
    f("entitlements", SEQ),
    f("extra_hosts", MAP_SEQ),
    f("isolation", STR),
    f("labels", MAP_SEQ),
    f("network", STR),
    f("no_cache", BOOL),
    f("platforms", SEQ),
    f("privileged", BOOL),
    f("pull", BOOL),
    f("secrets", SEQ),
    f("shm_size", STR_NUM),
    f("tags", SEQ),
    f("target", STR),
    f("ulimits", MAP),
];

const HEALTHCHECK_FIELDS: &[Field] = &[
    f("test", STR_SEQ),
    f("interval", STR),
    f("timeout", STR),
    f("retries", NUM),
    f("start_period", STR),
    f("start_interval", STR),
    f("disable", BOOL),
];
const HEALTHCHECK_REQUIRED: &[Required] = &[Required::unless("test", "disable")];

const LOGGING_FIELDS: &[Field] = &[f("driver", STR), f("options", MAP_NULL)];

const EXTENDS_FIELDS: &[Field] = &[f("service", STR), f("file", STR)];
const EXTENDS_REQUIRED: &[Required] = &[Required::key("service")];

const RESOURCE_FIELDS: &[Field] = &[
    f("cpus", STR_NUM),
    f("memory", STR),
    f("pids", NUM),
    f("devices", SEQ),
    f("generic_resources", SEQ),
];
const RESOURCES_FIELDS: &[Field] = &[
    Field::new("limits", Spec::of(MAP).fields(RESOURCE_FIELDS)),
    Field::new("reservations", Spec::of(MAP).fields(RESOURCE_FIELDS)),
];

const RESTART_POLICY_FIELDS: &[Field] = &[
    Field::new("condition", Spec::of(STR).allowed(&["none", "on-failure", "any"])),
    f("delay", STR),
    f("max_attempts", NUM),
    f("window", STR),
];

const DEPLOY_FIELDS: &[Field] = &[
    Field::new(
        "mode",
        Spec::of(STR).allowed(&["global", "replicated", "global-job", "replicated-job"]),
    ),
    f("replicas", NUM),
    f("labels", MAP_SEQ),
    Field::new("endpoint_mode", Spec::of(STR).allowed(&["vip", "dnsrr"])),
    f("placement", MAP),
    Field::new("resources", Spec::of(MAP).fields(RESOURCES_FIELDS)),
    Field::new("restart_policy", Spec::of(MAP).fields(RESTART_POLICY_FIELDS)),
    f("update_config", MAP),
    f("rollback_config", MAP),
];

const SERVICE_FIELDS: &[Field] = &[
    any("annotations"),
    f("attach", BOOL),
    f("blkio_config", MAP),
    Field::new("build", Spec::of(STR_MAP).fields(BUILD_FIELDS)),
    f("cap_add", SEQ),
    f("cap_drop", SEQ),
    f("cgroup", STR),
    f("cgroup_parent", STR),
    f("command", STR_SEQ),
    f("configs", SEQ),
    f("container_name", STR),
    f("cpu_count", NUM),
    f("cpu_percent", NUM),
    f("cpu_period", STR_NUM),
    f("cpu_quota", STR_NUM),
    f("cpu_rt_period", STR_NUM),
    f("cpu_rt_runtime", STR_NUM),
    f("cpu_shares", STR_NUM),
    f("cpus", STR_NUM),
    f("cpuset", STR),
    f("credential_spec", MAP),
    f("depends_on", MAP_SEQ),
    Field::new("deploy", Spec::of(MAP).fields(DEPLOY_FIELDS)).since(SchemaVersion::V3),
    f("develop", MAP),
    f("device_cgroup_rules", SEQ),
    f("devices", SEQ),
    f("dns", STR_SEQ),
    f("dns_opt", SEQ),
    f("dns_search", STR_SEQ),
    f("domainname", STR),
    f("entrypoint", STR_SEQ),
    f("env_file", STR_SEQ),
    f("environment", MAP_SEQ),
    f("expose", SEQ),
    Field::new("extends", Spec::of(STR_MAP).fields(EXTENDS_FIELDS).required(EXTENDS_REQUIRED)),
    f("external_links", SEQ),
    f("extra_hosts", MAP_SEQ),
    any("gpus"),
    f("group_add", SEQ),
    Field::new(
        "healthcheck",
        Spec::of(MAP).fields(HEALTHCHECK_FIELDS).required(HEALTHCHECK_REQUIRED),
    ),
    f("hostname", STR),
    f("image", STR),
    f("init", BOOL),
    f("ipc", STR),
    f("isolation", STR),
    f("labels", MAP_SEQ),
    f("label_file", STR_SEQ),
    f("links", SEQ),
    Field::new("logging", Spec::of(MAP).fields(LOGGING_FIELDS)),
    f("mac_address", STR),
    f("mem_limit", STR_NUM),
    f("mem_reservation", STR_NUM),
    f("mem_swappiness", NUM),
    f("memswap_limit", STR_NUM),
    f("network_mode", STR),
    f("networks", MAP_SEQ),
    f("oom_kill_disable", BOOL),
    f("oom_score_adj", NUM),
    f("pid", STR),
    f("pids_limit", STR_NUM),
    f("platform", STR),
    Field::new("ports", Spec::of(SEQ).items(&PORT)),
    f("post_start", SEQ),
    f("pre_stop", SEQ),
    f("privileged", BOOL),
    f("profiles", SEQ),
    Field::new("pull_policy", Spec::of(STR).allowed(PULL_POLICY_VALUES)),
    f("read_only", BOOL),
    Field::new("restart", Spec::of(STR).allowed(RESTART_VALUES)),
    f("runtime", STR),
    f("scale", NUM),
    f("secrets", SEQ),
    f("security_opt", SEQ),
    f("shm_size", STR_NUM),
    f("stdin_open", BOOL),
    f("stop_grace_period", STR),
    f("stop_signal", STR),
    f("storage_opt", MAP),
    f("sysctls", MAP_SEQ),
    f("tmpfs", STR_SEQ),
    f("tty", BOOL),
    f("ulimits", MAP),
    f("user", STR),
    f("userns_mode", STR),
    f("uts", STR),
    f("volumes", SEQ),
    f("volume_driver", STR),
    f("volumes_from", SEQ),
    f("working_dir", STR),
];
const SERVICE: Spec = Spec::of(MAP).fields(SERVICE_FIELDS);

const NETWORK_FIELDS: &[Field] = &[
    f("driver", STR),
    f("driver_opts", MAP),
    f("attachable", BOOL),
    f("enable_ipv4", BOOL),
    f("enable_ipv6", BOOL),
    f("external", BOOL_MAP),
    f("internal", BOOL),
    f("ipam", MAP),
    f("labels", MAP_SEQ),
    f("name", STR),
];
const NETWORK: Spec = Spec::of(MAP_NULL).fields(NETWORK_FIELDS);

const VOLUME_FIELDS: &[Field] = &[
    f("driver", STR),
    f("driver_opts", MAP),
    f("external", BOOL_MAP),
    f("labels", MAP_SEQ),
    f("name", STR),
];
const VOLUME: Spec = Spec::of(MAP_NULL).fields(VOLUME_FIELDS);

const RESOURCE_FILE_FIELDS: &[Field] = &[
    f("file", STR),
    f("environment", STR),
    f("content", STR),
    f("external", BOOL_MAP),
    f("name", STR),
    f("labels", MAP_SEQ),
    f("driver", STR),
    f("driver_opts", MAP),
    f("template_driver", STR),
];
const RESOURCE_FILE: Spec = Spec::of(MAP).fields(RESOURCE_FILE_FIELDS);

const ROOT_FIELDS: &[Field] = &[
    f("version", STR_NUM),
    f("name", STR).since(SchemaVersion::Spec),
    f("include", STR_SEQ).since(SchemaVersion::Spec),
    Field::new("services", Spec::of(MAP).entries(&SERVICE)),
    Field::new("networks", Spec::of(MAP_NULL).entries(&NETWORK)),
    Field::new("volumes", Spec::of(MAP_NULL).entries(&VOLUME)),
    Field::new("configs", Spec::of(MAP_NULL).entries(&RESOURCE_FILE)),
    Field::new("secrets", Spec::of(MAP_NULL).entries(&RESOURCE_FILE)),
];
const ROOT_REQUIRED: &[Required] = &[Required::unless("services", "include")];

/// Shape of a compose document root.
pub static ROOT: Spec = Spec::of(MAP).fields(ROOT_FIELDS).required(ROOT_REQUIRED);
