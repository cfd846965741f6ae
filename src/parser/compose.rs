//! Typed view of a Docker Compose document.
//!
//! Built from the merged [`Node`] tree. Construction never fails: values
//! with an unexpected type are skipped here and reported by the schema
//! validator instead.

use crate::parser::{Location, Node, NodeKind};

/// A value together with where it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located<T> {
    pub value: T,
    pub location: Location,
}

impl<T> Located<T> {
    pub fn new(value: T, location: Location) -> Self {
        Self { value, location }
    }
}

/// Parsed Docker Compose file.
#[derive(Debug, Clone, Default)]
pub struct ComposeFile {
    /// The obsolete `version` field.
    pub version: Option<Located<String>>,
    /// The `name` field (project name).
    pub name: Option<Located<String>>,
    /// Services in document order.
    pub services: Vec<Service>,
}

/// One `depends_on` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Name of the service depended on.
    pub service: String,
    /// Long-syntax `condition`, if any.
    pub condition: Option<String>,
    pub location: Location,
}

/// A service definition.
#[derive(Debug, Clone, Default)]
pub struct Service {
    pub name: String,
    /// Location of the service key.
    pub location: Location,
    pub image: Option<Located<String>>,
    /// Location of the `build` key.
    pub build: Option<Location>,
    pub container_name: Option<Located<String>>,
    pub ports: Vec<ServicePort>,
    pub pull_policy: Option<String>,
    pub privileged: Option<Located<bool>>,
    pub security_opt: Vec<String>,
    /// Whether a CPU limit is declared (`deploy.resources.limits.cpus` or `cpus`).
    pub has_cpu_limit: bool,
    /// Whether a memory limit is declared (`deploy.resources.limits.memory` or `mem_limit`).
    pub has_memory_limit: bool,
    /// Whether a `healthcheck` is defined and not disabled.
    pub has_healthcheck: bool,
    pub depends_on: Vec<Dependency>,
    /// All keys in this service, in order.
    pub keys: Vec<String>,
}

impl Service {
    /// Location of a key inside this service, falling back to the service itself.
    pub fn key_location(&self, key: &str, node: &Node) -> Location {
        match node.entry(key) {
            Some(entry) => Location::new(
                entry.value.file,
                entry.key_pos,
                format!("{}.{}", self.location.path, key),
            ),
            None => self.location.clone(),
        }
    }

    /// Whether any port is published on the host. A port without an
    /// explicit host port still gets an ephemeral one.
    pub fn publishes_ports(&self) -> bool {
        !self.ports.is_empty()
    }
}

/// Inclusive port range; a single port has `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

impl PortRange {
    pub fn single(port: u16) -> Self {
        Self {
            start: port,
            end: port,
        }
    }

    /// Parse `8080` or `8000-8005`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        match s.split_once('-') {
            Some((a, b)) => {
                let start: u16 = a.trim().parse().ok()?;
                let end: u16 = b.trim().parse().ok()?;
                (start <= end).then_some(Self { start, end })
            }
            None => s.parse().ok().map(Self::single),
        }
    }

    pub fn ports(&self) -> impl Iterator<Item = u16> {
        self.start..=self.end
    }
}

/// Port mapping for a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePort {
    /// Raw port text (e.g., "8080:80"); long syntax is rendered back to short form.
    pub raw: String,
    pub location: Location,
    /// Whether the short-syntax value is quoted in source.
    pub quoted: bool,
    /// Whether the value was a plain scalar (short syntax) in source.
    pub short_syntax: bool,
    /// Host IP binding (e.g., "127.0.0.1").
    pub host_ip: Option<String>,
    /// Published host port(s), if any.
    pub host_ports: Option<PortRange>,
    pub container_ports: PortRange,
    /// Protocol, defaulting to `tcp`.
    pub protocol: String,
}

impl ServicePort {
    /// Parse a short-syntax port string.
    ///
    /// Formats: `80`, `8080:80`, `127.0.0.1:8080:80`, `[::1]:8080:80`,
    /// `8000-8005:8000-8005`, each optionally suffixed with `/udp`.
    pub fn parse(raw: &str, location: Location, quoted: bool) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let (mapping, protocol) = match raw.rsplit_once('/') {
            Some((m, p)) => (m, p.to_lowercase()),
            None => (raw, "tcp".to_string()),
        };

        let (host_ip, rest) = split_host_ip(mapping)?;

        let (host_ports, container_ports) = match rest.rsplit_once(':') {
            Some((host, container)) => {
                let host_ports = if host.is_empty() {
                    None
                } else {
                    Some(PortRange::parse(host)?)
                };
                (host_ports, PortRange::parse(container)?)
            }
            None => (None, PortRange::parse(rest)?),
        };

        Some(Self {
            raw: raw.to_string(),
            location,
            quoted,
            short_syntax: true,
            host_ip,
            host_ports,
            container_ports,
            protocol,
        })
    }

    /// Build from long syntax (`target`, `published`, `host_ip`, `protocol`).
    pub fn from_long_syntax(node: &Node, location: Location) -> Option<Self> {
        let container_ports = PortRange::parse(node.get("target")?.text()?)?;
        let host_ports = node
            .get("published")
            .and_then(Node::text)
            .and_then(PortRange::parse);
        let host_ip = node.get("host_ip").and_then(Node::as_str).map(str::to_string);
        let protocol = node
            .get("protocol")
            .and_then(Node::as_str)
            .unwrap_or("tcp")
            .to_lowercase();

        let raw = match host_ports {
            Some(h) => format!("{}:{}", render_range(h), render_range(container_ports)),
            None => render_range(container_ports),
        };

        Some(Self {
            raw,
            location,
            quoted: false,
            short_syntax: false,
            host_ip,
            host_ports,
            container_ports,
            protocol,
        })
    }

    /// Host IP with unbound meaning "all interfaces".
    pub fn binds_all_interfaces(&self) -> bool {
        matches!(self.host_ip.as_deref(), None | Some("0.0.0.0") | Some("::") | Some(""))
    }
}

fn render_range(range: PortRange) -> String {
    if range.start == range.end {
        range.start.to_string()
    } else {
        format!("{}-{}", range.start, range.end)
    }
}

fn split_host_ip(mapping: &str) -> Option<(Option<String>, &str)> {
    if let Some(bracketed) = mapping.strip_prefix('[') {
        let end = bracketed.find(']')?;
        let ip = &bracketed[..end];
        let rest = bracketed[end + 1..].strip_prefix(':')?;
        return Some((Some(ip.to_string()), rest));
    }
    match mapping.matches(':').count() {
        2 => {
            let (ip, rest) = mapping.split_once(':')?;
            Some((Some(ip.to_string()), rest))
        }
        // Unbracketed IPv6: the last two fields are host and container.
        n if n > 2 => {
            let (front, _) = mapping.rsplit_once(':')?;
            let (ip, _) = front.rsplit_once(':')?;
            Some((Some(ip.to_string()), &mapping[ip.len() + 1..]))
        }
        _ => Some((None, mapping)),
    }
}

impl ComposeFile {
    /// Build the typed view over a merged document root.
    pub fn from_root(root: &Node) -> Self {
        let mut compose = ComposeFile::default();

        if let Some(entry) = root.entry("version") {
            if let Some(text) = entry.value.text() {
                compose.version = Some(Located::new(
                    text.to_string(),
                    Location::new(entry.value.file, entry.key_pos, "version"),
                ));
            }
        }

        if let Some(entry) = root.entry("name") {
            if let Some(text) = entry.value.as_str() {
                compose.name = Some(Located::new(
                    text.to_string(),
                    Location::new(entry.value.file, entry.key_pos, "name"),
                ));
            }
        }

        if let Some(entry) = root.entry("services") {
            for service in entry.value.as_mapping().unwrap_or_default() {
                let location = Location::new(
                    service.value.file,
                    service.key_pos,
                    format!("services.{}", service.key),
                );
                compose.services.push(parse_service(&service.key, &service.value, location));
            }
        }

        compose
    }

    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name == name)
    }
}

fn located_str(service: &Service, node: &Node, key: &str) -> Option<Located<String>> {
    let value = node.get(key)?.as_str()?;
    Some(Located::new(value.to_string(), service.key_location(key, node)))
}

fn string_list(node: Option<&Node>) -> Vec<String> {
    match node {
        Some(n) => match &n.kind {
            NodeKind::Sequence(items) => items.iter().filter_map(|i| i.text().map(str::to_string)).collect(),
            NodeKind::Mapping(entries) => entries.iter().map(|e| e.key.clone()).collect(),
            NodeKind::Scalar(_) => n.text().map(|t| vec![t.to_string()]).unwrap_or_default(),
        },
        None => Vec::new(),
    }
}

/// `depends_on` in list form or mapping form.
fn dependencies(service: &Service, node: Option<&Node>) -> Vec<Dependency> {
    let base = format!("{}.depends_on", service.location.path);
    match node.map(|n| &n.kind) {
        Some(NodeKind::Sequence(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(idx, item)| {
                Some(Dependency {
                    service: item.text()?.to_string(),
                    condition: None,
                    location: Location::new(item.file, item.pos, format!("{base}[{idx}]")),
                })
            })
            .collect(),
        Some(NodeKind::Mapping(entries)) => entries
            .iter()
            .map(|e| Dependency {
                service: e.key.clone(),
                condition: e.value.get("condition").and_then(Node::as_str).map(str::to_string),
                location: Location::new(e.value.file, e.key_pos, format!("{base}.{}", e.key)),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Parse a service definition.
fn parse_service(name: &str, node: &Node, location: Location) -> Service {
    let mut service = Service {
        name: name.to_string(),
        location,
        ..Default::default()
    };

    let Some(entries) = node.as_mapping() else {
        return service;
    };

    service.keys = entries.iter().map(|e| e.key.clone()).collect();
    service.image = located_str(&service, node, "image");
    service.container_name = located_str(&service, node, "container_name");
    service.build = node.entry("build").map(|_| service.key_location("build", node));
    service.pull_policy = node.get("pull_policy").and_then(Node::as_str).map(str::to_string);

    if let Some(privileged) = node.get("privileged").and_then(Node::as_bool) {
        service.privileged = Some(Located::new(privileged, service.key_location("privileged", node)));
    }

    service.security_opt = string_list(node.get("security_opt"));
    service.depends_on = dependencies(&service, node.get("depends_on"));

    let limits = node
        .get("deploy")
        .and_then(|d| d.get("resources"))
        .and_then(|r| r.get("limits"));
    let has_limit = |key: &str| limits.and_then(|l| l.get(key)).is_some_and(|v| !v.is_null());
    service.has_cpu_limit = has_limit("cpus") || node.get("cpus").is_some_and(|v| !v.is_null());
    service.has_memory_limit = has_limit("memory") || node.get("mem_limit").is_some_and(|v| !v.is_null());

    service.has_healthcheck = node.get("healthcheck").is_some_and(|h| {
        h.get("disable").and_then(Node::as_bool) != Some(true)
    });

    if let Some(ports) = node.get("ports").and_then(Node::as_sequence) {
        for (idx, item) in ports.iter().enumerate() {
            let location = Location::new(
                item.file,
                item.pos,
                format!("{}.ports[{}]", service.location.path, idx),
            );
            let port = match &item.kind {
                NodeKind::Scalar(scalar) => item
                    .text()
                    .and_then(|text| ServicePort::parse(text, location, scalar.quoted)),
                NodeKind::Mapping(_) => ServicePort::from_long_syntax(item, location),
                NodeKind::Sequence(_) => None,
            };
            if let Some(port) = port {
                service.ports.push(port);
            }
        }
    }

    service
}
