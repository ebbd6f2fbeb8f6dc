//! 图标集

macro_rules! qure_icon {
    ($file:literal) => {
        concat!(
            "https://testingcf.jsdelivr.net/gh/Koolson/Qure@master/IconSet/Color/",
            $file
        )
    };
}

pub const US: &str = qure_icon!("United_States.png");
pub const JP: &str = qure_icon!("Japan.png");
pub const SG: &str = qure_icon!("Singapore.png");
pub const HK: &str = qure_icon!("Hong_Kong.png");
pub const TW: &str = qure_icon!("Taiwan.png");
pub const PROXY: &str = qure_icon!("Proxy.png");
pub const AUTO: &str = qure_icon!("Auto.png");
pub const MANUAL: &str =
    "https://testingcf.jsdelivr.net/gh/shindgewongxj/WHATSINStash@master/icon/select.png";
pub const GLOBAL: &str = qure_icon!("Global.png");
pub const AD_BLACK: &str = qure_icon!("AdBlack.png");
pub const HIJACKING: &str = qure_icon!("Hijacking.png");
pub const FINAL: &str = qure_icon!("Final.png");
