use bitflags::bitflags;

/// Element of a damage instance.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::AsRefStr,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DamageType {
    #[default]
    Generic,
    Physical,
    Fire,
    Ice,
    Lightning,
    Wind,
    Light,
    Dark,
}

bitflags! {
    /// Properties of a damage instance that change how it is applied.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct DamageFlags: u8 {
        /// Critical hit.
        const CRIT = 0b0000_0001;
        /// Periodic damage; already bypasses mitigation.
        const DOT = 0b0000_0010;
        /// Self-inflicted or "price" damage; ignores shields.
        const COST = 0b0000_0100;
        /// Skip defense and mitigation.
        const TRUE_DAMAGE = 0b0000_1000;
    }
}
