// Icon asset URLs under a day/night directory layout
use crate::application::normalizer::IconAssetResolver;

#[derive(Debug, Clone)]
pub struct UrlIconResolver {
    base: String,
}

impl UrlIconResolver {
    pub fn new(base: &str) -> Self {
        Self {
            base: format!("{}/", base.trim_end_matches('/')),
        }
    }
}

impl IconAssetResolver for UrlIconResolver {
    /// `<base>/day/<code>.svg` or `<base>/night/<code>.svg`
    fn resolve(&self, code: &str, is_night: bool) -> String {
        let variant = if is_night { "night" } else { "day" };
        format!("{}{}/{}.svg", self.base, variant, code.trim())
    }
}
