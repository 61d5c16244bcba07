//! Role inference from net names
//!
//! Roles come from an ordered rule table: the first rule whose matcher
//! accepts a net decides its role. Differential membership is computed
//! beforehand with the profile's suffix templates, so the diff rules can sit
//! at their place in the order like any other rule.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

use crate::profiles::{DiffTemplate, McuProfile, PinCapability};

/// Electrical/functional role of a net
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    GpioIn,
    GpioOut,
    I2cSda,
    I2cScl,
    SpiMosi,
    SpiMiso,
    SpiSck,
    SpiCs,
    UartTx,
    UartRx,
    Pwm,
    Adc,
    Power,
    Ground,
    DiffPos,
    DiffNeg,
    Unknown,
}

impl Role {
    pub const ALL: [Role; 17] = [
        Role::GpioIn,
        Role::GpioOut,
        Role::I2cSda,
        Role::I2cScl,
        Role::SpiMosi,
        Role::SpiMiso,
        Role::SpiSck,
        Role::SpiCs,
        Role::UartTx,
        Role::UartRx,
        Role::Pwm,
        Role::Adc,
        Role::Power,
        Role::Ground,
        Role::DiffPos,
        Role::DiffNeg,
        Role::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::GpioIn => "gpio_in",
            Role::GpioOut => "gpio_out",
            Role::I2cSda => "i2c_sda",
            Role::I2cScl => "i2c_scl",
            Role::SpiMosi => "spi_mosi",
            Role::SpiMiso => "spi_miso",
            Role::SpiSck => "spi_sck",
            Role::SpiCs => "spi_cs",
            Role::UartTx => "uart_tx",
            Role::UartRx => "uart_rx",
            Role::Pwm => "pwm",
            Role::Adc => "adc",
            Role::Power => "power",
            Role::Ground => "ground",
            Role::DiffPos => "diff_pos",
            Role::DiffNeg => "diff_neg",
            Role::Unknown => "unknown",
        }
    }

    /// Human-readable description used by the documentation emitters
    pub fn description(&self) -> &'static str {
        match self {
            Role::GpioIn => "Digital input",
            Role::GpioOut => "Digital output",
            Role::I2cSda => "I2C data",
            Role::I2cScl => "I2C clock",
            Role::SpiMosi => "SPI controller out",
            Role::SpiMiso => "SPI controller in",
            Role::SpiSck => "SPI clock",
            Role::SpiCs => "SPI chip select",
            Role::UartTx => "UART transmit",
            Role::UartRx => "UART receive",
            Role::Pwm => "PWM output",
            Role::Adc => "Analog input",
            Role::Power => "Power supply",
            Role::Ground => "Ground",
            Role::DiffPos => "Differential pair (+)",
            Role::DiffNeg => "Differential pair (-)",
            Role::Unknown => "General purpose",
        }
    }

    /// Capability a pin needs to carry this role, if any
    pub fn required_capability(&self) -> Option<PinCapability> {
        match self {
            Role::I2cSda | Role::I2cScl => Some(PinCapability::I2c),
            Role::SpiMosi | Role::SpiMiso | Role::SpiSck | Role::SpiCs => Some(PinCapability::Spi),
            Role::UartTx | Role::UartRx => Some(PinCapability::Uart),
            Role::Pwm => Some(PinCapability::Pwm),
            Role::Adc => Some(PinCapability::Adc),
            Role::GpioIn | Role::GpioOut => Some(PinCapability::Gpio),
            Role::Power | Role::Ground | Role::DiffPos | Role::DiffNeg | Role::Unknown => None,
        }
    }

    pub fn bus_kind(&self) -> Option<BusKind> {
        match self {
            Role::I2cSda | Role::I2cScl => Some(BusKind::I2c),
            Role::SpiMosi | Role::SpiMiso | Role::SpiSck | Role::SpiCs => Some(BusKind::Spi),
            Role::UartTx | Role::UartRx => Some(BusKind::Uart),
            _ => None,
        }
    }

    pub fn is_supply(&self) -> bool {
        matches!(self, Role::Power | Role::Ground)
    }

    pub fn is_differential(&self) -> bool {
        matches!(self, Role::DiffPos | Role::DiffNeg)
    }

    /// Roles where the MCU actively drives the line
    pub fn drives_pin(&self) -> bool {
        matches!(
            self,
            Role::GpioOut
                | Role::Pwm
                | Role::UartTx
                | Role::SpiMosi
                | Role::SpiSck
                | Role::SpiCs
                | Role::I2cSda
                | Role::I2cScl
        )
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusKind {
    I2c,
    Spi,
    Uart,
}

impl BusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BusKind::I2c => "I2C",
            BusKind::Spi => "SPI",
            BusKind::Uart => "UART",
        }
    }
}

impl fmt::Display for BusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nets sharing a bus kind and instance number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusGroup {
    pub kind: BusKind,
    pub instance: u32,
    /// Sorted net names
    pub members: Vec<String>,
}

impl BusGroup {
    /// `I2C0`, `SPI1`, ...
    pub fn label(&self) -> String {
        format!("{}{}", self.kind, self.instance)
    }
}

/// A positive net and, when present, its negative partner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifferentialPair {
    pub positive: String,
    pub negative: Option<String>,
    pub positive_suffix: String,
    pub negative_suffix: String,
}

impl DifferentialPair {
    pub fn is_complete(&self) -> bool {
        self.negative.is_some()
    }

    /// Name the missing partner would have
    pub fn expected_negative(&self) -> String {
        let cut = self.positive.len().saturating_sub(self.positive_suffix.len());
        let base = self.positive.get(..cut).unwrap_or(&self.positive);
        format!("{}{}", base, self.negative_suffix)
    }
}

/// One way a net name can satisfy a role rule; names are compared upper-cased
#[derive(Debug, Clone, Copy)]
pub enum NamePattern {
    Contains(&'static str),
    Prefix(&'static str),
    Suffix(&'static str),
    /// Whole token after splitting on non-alphanumeric characters
    Token(&'static str),
}

impl NamePattern {
    fn matches(&self, upper: &str) -> bool {
        match self {
            NamePattern::Contains(s) => upper.contains(s),
            NamePattern::Prefix(s) => upper.starts_with(s),
            NamePattern::Suffix(s) => upper.ends_with(s),
            NamePattern::Token(s) => upper
                .split(|c: char| !c.is_ascii_alphanumeric())
                .any(|token| token == *s),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum RuleMatcher {
    Name(&'static [NamePattern]),
    /// Supply name that carries none of the [`SIGNAL_MARKERS`]
    Supply(&'static [NamePattern]),
    /// Positive member of a pair, complete or lonely
    DiffPositive,
    /// Negative member of a complete pair
    DiffNegative,
}

#[derive(Debug, Clone, Copy)]
pub struct RoleRule {
    pub role: Role,
    pub matcher: RuleMatcher,
}

use NamePattern::{Contains, Prefix, Suffix, Token};

/// Parts of a name that make a rail-named net a signal (`VBAT_ADC`,
/// `VBUS_SENSE`, `3V3_EN`)
pub static SIGNAL_MARKERS: &[NamePattern] = &[
    Contains("ADC"),
    Contains("ANALOG"),
    Contains("PWM"),
    Token("SENSE"),
    Token("DET"),
    Token("EN"),
    Token("TX"),
    Token("RX"),
    Token("SDA"),
    Token("SCL"),
    Token("LED"),
    Token("BTN"),
];

/// Ordered role rules; the first match wins.
pub static ROLE_RULES: &[RoleRule] = &[
    RoleRule {
        role: Role::Ground,
        matcher: RuleMatcher::Supply(&[
            Token("GND"),
            Prefix("GND"),
            Prefix("AGND"),
            Prefix("DGND"),
            Prefix("PGND"),
            Token("VSS"),
            Prefix("VSS"),
            Contains("GROUND"),
        ]),
    },
    RoleRule {
        role: Role::Power,
        matcher: RuleMatcher::Supply(&[
            Contains("VCC"),
            Contains("VDD"),
            Contains("VBUS"),
            Contains("VBAT"),
            Contains("VSYS"),
            Contains("3V3"),
            Contains("1V8"),
            Prefix("+"),
            Token("5V"),
            Token("12V"),
            Token("VIN"),
        ]),
    },
    RoleRule {
        role: Role::DiffPos,
        matcher: RuleMatcher::DiffPositive,
    },
    RoleRule {
        role: Role::DiffNeg,
        matcher: RuleMatcher::DiffNegative,
    },
    // SCLK/SCK before SCL
    RoleRule {
        role: Role::SpiSck,
        matcher: RuleMatcher::Name(&[Contains("SCLK"), Contains("SCK")]),
    },
    RoleRule {
        role: Role::I2cSda,
        matcher: RuleMatcher::Name(&[Contains("SDA")]),
    },
    RoleRule {
        role: Role::I2cScl,
        matcher: RuleMatcher::Name(&[Contains("SCL")]),
    },
    RoleRule {
        role: Role::SpiMosi,
        matcher: RuleMatcher::Name(&[Contains("MOSI"), Contains("COPI")]),
    },
    RoleRule {
        role: Role::SpiMiso,
        matcher: RuleMatcher::Name(&[Contains("MISO"), Contains("CIPO")]),
    },
    RoleRule {
        role: Role::SpiCs,
        matcher: RuleMatcher::Name(&[
            Token("CS"),
            Token("NCS"),
            Token("CSN"),
            Token("SS"),
            Token("NSS"),
        ]),
    },
    RoleRule {
        role: Role::UartTx,
        matcher: RuleMatcher::Name(&[Suffix("_TX"), Token("TX"), Token("TXD")]),
    },
    RoleRule {
        role: Role::UartRx,
        matcher: RuleMatcher::Name(&[Suffix("_RX"), Token("RX"), Token("RXD")]),
    },
    RoleRule {
        role: Role::Pwm,
        matcher: RuleMatcher::Name(&[Contains("PWM"), Prefix("SERVO")]),
    },
    RoleRule {
        role: Role::Adc,
        matcher: RuleMatcher::Name(&[Contains("ADC"), Prefix("AIN"), Contains("ANALOG")]),
    },
    RoleRule {
        role: Role::GpioIn,
        matcher: RuleMatcher::Name(&[
            Token("IN"),
            Token("INPUT"),
            Token("BTN"),
            Token("BUTTON"),
            Token("SW"),
            Token("SENSE"),
            Prefix("BTN"),
            Prefix("BUTTON"),
        ]),
    },
    RoleRule {
        role: Role::GpioOut,
        matcher: RuleMatcher::Name(&[
            Token("OUT"),
            Token("OUTPUT"),
            Token("LED"),
            Token("EN"),
            Prefix("LED"),
        ]),
    },
];

/// Differential membership of the nets being classified
#[derive(Debug, Clone, Default)]
pub struct DiffMembership {
    positives: BTreeSet<String>,
    negatives: BTreeSet<String>,
}

impl DiffMembership {
    pub fn from_pairs(pairs: &[DifferentialPair]) -> Self {
        let mut membership = Self::default();
        for pair in pairs {
            membership.positives.insert(pair.positive.clone());
            if let Some(negative) = &pair.negative {
                membership.negatives.insert(negative.clone());
            }
        }
        membership
    }
}

/// Classify one net against [`ROLE_RULES`].
pub fn classify(net_name: &str, membership: &DiffMembership) -> Role {
    let upper = net_name.to_uppercase();
    for rule in ROLE_RULES {
        let matched = match rule.matcher {
            RuleMatcher::Name(patterns) => patterns.iter().any(|p| p.matches(&upper)),
            RuleMatcher::Supply(patterns) => {
                patterns.iter().any(|p| p.matches(&upper))
                    && !SIGNAL_MARKERS.iter().any(|p| p.matches(&upper))
            }
            RuleMatcher::DiffPositive => membership.positives.contains(net_name),
            RuleMatcher::DiffNegative => membership.negatives.contains(net_name),
        };
        if matched {
            return rule.role;
        }
    }
    Role::Unknown
}

/// Classify a net by name alone, without differential pairing
pub fn infer_role(net_name: &str) -> Role {
    classify(net_name, &DiffMembership::default())
}

fn strip_template_suffix<'a>(upper: &'a str, suffix: &str) -> Option<&'a str> {
    upper
        .strip_suffix(suffix)
        .filter(|base| !base.is_empty())
}

/// Pair nets by suffix templates, tried in order.
///
/// Each net joins at most one pair. Positives left without a partner become
/// lonely pairs under the first template whose positive suffix they carry.
pub fn detect_differential_pairs<'a, I>(net_names: I, templates: &[DiffTemplate]) -> Vec<DifferentialPair>
where
    I: IntoIterator<Item = &'a str>,
{
    let names: BTreeSet<&str> = net_names.into_iter().collect();
    let mut by_upper: HashMap<String, &str> = HashMap::new();
    for name in &names {
        by_upper.entry(name.to_uppercase()).or_insert(*name);
    }

    let mut matched: BTreeSet<&str> = BTreeSet::new();
    let mut pairs = Vec::new();

    for template in templates {
        for name in &names {
            if matched.contains(name) {
                continue;
            }
            let upper = name.to_uppercase();
            let Some(base) = strip_template_suffix(&upper, template.positive) else {
                continue;
            };
            let wanted = format!("{}{}", base, template.negative);
            let Some(&partner) = by_upper.get(&wanted) else {
                continue;
            };
            if partner == *name || matched.contains(partner) {
                continue;
            }
            matched.insert(*name);
            matched.insert(partner);
            pairs.push(DifferentialPair {
                positive: name.to_string(),
                negative: Some(partner.to_string()),
                positive_suffix: template.positive.to_string(),
                negative_suffix: template.negative.to_string(),
            });
        }
    }

    for name in &names {
        if matched.contains(name) {
            continue;
        }
        let upper = name.to_uppercase();
        if let Some(template) = templates
            .iter()
            .find(|t| strip_template_suffix(&upper, t.positive).is_some())
        {
            pairs.push(DifferentialPair {
                positive: name.to_string(),
                negative: None,
                positive_suffix: template.positive.to_string(),
                negative_suffix: template.negative.to_string(),
            });
        }
    }

    pairs.sort_by(|a, b| a.positive.cmp(&b.positive));
    pairs
}

static BUS_INSTANCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:I2C|SPI|USART|UART)(\d+)").expect("valid bus regex"));

/// Bus instance number embedded in a net name, 0 when absent
pub fn bus_instance(net_name: &str) -> u32 {
    BUS_INSTANCE
        .captures(&net_name.to_uppercase())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Group bus-role nets by kind and instance
pub fn group_buses(roles: &BTreeMap<String, Role>) -> Vec<BusGroup> {
    let mut groups: BTreeMap<(BusKind, u32), Vec<String>> = BTreeMap::new();
    for (net, role) in roles {
        if let Some(kind) = role.bus_kind() {
            groups
                .entry((kind, bus_instance(net)))
                .or_default()
                .push(net.clone());
        }
    }
    groups
        .into_iter()
        .map(|((kind, instance), mut members)| {
            members.sort();
            BusGroup {
                kind,
                instance,
                members,
            }
        })
        .collect()
}

/// Roles, bus groups and differential pairs for a set of nets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleInference {
    pub roles: BTreeMap<String, Role>,
    pub buses: Vec<BusGroup>,
    pub pairs: Vec<DifferentialPair>,
}

pub fn infer_roles<'a, I>(net_names: I, profile: &dyn McuProfile) -> RoleInference
where
    I: IntoIterator<Item = &'a str>,
{
    let names: BTreeSet<&str> = net_names.into_iter().collect();
    let pairs = detect_differential_pairs(names.iter().copied(), profile.differential_templates());
    let membership = DiffMembership::from_pairs(&pairs);

    let roles: BTreeMap<String, Role> = names
        .iter()
        .map(|name| (name.to_string(), classify(name, &membership)))
        .collect();
    let buses = group_buses(&roles);

    debug!(
        "Inferred roles for {} nets: {} bus groups, {} differential pairs",
        roles.len(),
        buses.len(),
        pairs.len()
    );

    RoleInference {
        roles,
        buses,
        pairs,
    }
}
