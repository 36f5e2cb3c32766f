use super::args::{parse_args, AttributesArgs};
use super::CatalogResolver;
use crate::attributes::{AttributeDataProvider, AttributeMetadata, TYPE_MULTISELECT, TYPE_SELECT};
use crate::error::{ResolverError, ResolverResult};
use serde_json::{json, Value};

impl CatalogResolver {
    /// `attributes(attributeCodes)`: metadata for every requested code, in request order.
    ///
    /// Codes the repository does not know are answered with zeroed entries; only when none of
    /// the codes is known the call fails with `NotFound`.
    pub async fn attributes(&self, args: &Value) -> ResolverResult<Value> {
        let args: AttributesArgs = parse_args(args)?;
        let codes: Vec<String> = args
            .attribute_codes
            .ok_or_else(|| ResolverError::invalid_input("Attribute codes should be specified"))?
            .into_iter()
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty())
            .collect();
        if codes.is_empty() {
            return Err(ResolverError::invalid_input(
                "Attribute codes should be specified",
            ));
        }

        let provider = self.attribute_provider()?;
        let store_id = self.store_id();
        let found = provider.attributes(&codes, store_id).await?;
        if found.is_empty() {
            return Err(ResolverError::not_found(format!(
                "Attributes {}",
                codes.join(", ")
            )));
        }

        let mut attributes = Vec::with_capacity(codes.len());
        for code in &codes {
            let mut attribute = match found.get(code) {
                Some(attribute) => attribute.clone(),
                None => {
                    tracing::debug!(code, store_id, "unknown attribute code");
                    AttributeMetadata::unknown(code)
                }
            };
            if matches!(attribute.attribute_type.as_str(), TYPE_SELECT | TYPE_MULTISELECT) {
                attribute.attribute_options = provider.options(&attribute, store_id).await?;
            }
            attributes.push(attribute);
        }
        Ok(json!({ "attributes": attributes }))
    }

    /// Options of the attribute `parent`, as nested under an `attributes` entry.
    pub async fn attribute_options(&self, parent: &Value) -> ResolverResult<Value> {
        let attribute: AttributeMetadata = serde_json::from_value(parent.clone())?;
        if attribute.attribute_code.is_empty() {
            return Err(ResolverError::invalid_input("Attribute code should be specified"));
        }
        let options = self
            .attribute_provider()?
            .options(&attribute, self.store_id())
            .await?;
        Ok(json!(options))
    }

    fn attribute_provider(&self) -> ResolverResult<&AttributeDataProvider> {
        self.attributes.as_ref().ok_or_else(|| {
            ResolverError::Upstream(anyhow::anyhow!("No attribute repository configured"))
        })
    }
}
