use crate::{
    descriptor::{BaseFormatters, EntityFormatter, EntityKind, FormatFn, FormatterDescriptor, RawEntity},
    error::{FormatError, RegistrationError},
    field::{FieldDef, FieldMap, FieldValue},
};

/// Transaction fields that tie an entity to its enclosing block. Forced to
/// `null` while the transaction is pending, for every chain and variant.
pub const BLOCK_ASSOCIATION_FIELDS: [&str; 3] = ["blockHash", "blockNumber", "transactionIndex"];

/// The merged formatter for one entity kind: base formatter, exclusion set
/// and chain override combined with fixed precedence.
#[derive(Clone, Copy, Debug)]
pub struct EffectiveFormatter {
    kind: EntityKind,
    base: FormatFn,
    descriptor: FormatterDescriptor,
}

impl EffectiveFormatter {
    /// Formats one raw entity.
    ///
    /// Steps, in fixed order:
    /// 1. run the base formatter on the raw entity;
    /// 2. drop every excluded field from the base output, even when the raw
    ///    payload carried a value for it;
    /// 3. run the chain override on the same raw entity;
    /// 4. merge the override output over the filtered base output (override
    ///    wins every key collision);
    /// 5. for transactions whose raw payload indicates pending state, force
    ///    the block-association fields to `null`, overriding whatever base
    ///    or override computed for them.
    pub fn format(&self, raw: &RawEntity) -> Result<FieldMap, FormatError> {
        let mut result = (self.base)(raw)?;

        for field in self.descriptor.exclude {
            result.remove(field);
        }

        let overrides = (self.descriptor.format)(raw)?;
        result.merge_from(overrides);

        if self.kind == EntityKind::Transaction && is_pending(raw) {
            for field in BLOCK_ASSOCIATION_FIELDS {
                result.insert(field, FieldValue::Null);
            }
        }

        Ok(result)
    }
}

/// A transaction is pending while it has no enclosing block hash.
fn is_pending(raw: &RawEntity) -> bool {
    raw.get("blockHash").is_none_or(serde_json::Value::is_null)
}

/// The per-client formatter registry: one [`EffectiveFormatter`] per entity
/// kind, constructed once at client construction time and read-only
/// afterwards. Replaces any process-wide formatter table; call sites receive
/// the registry by reference.
#[derive(Clone, Copy, Debug)]
pub struct ChainFormatters {
    block: EffectiveFormatter,
    transaction: EffectiveFormatter,
    transaction_request: EffectiveFormatter,
}

impl ChainFormatters {
    /// Starts building a registry on top of a base formatter set. Entity
    /// kinds that receive no descriptor use the identity override.
    pub fn builder(base: BaseFormatters) -> ChainFormattersBuilder {
        ChainFormattersBuilder {
            base,
            block: FormatterDescriptor::IDENTITY,
            transaction: FormatterDescriptor::IDENTITY,
            transaction_request: FormatterDescriptor::IDENTITY,
        }
    }

    /// The merged block formatter.
    pub fn block(&self) -> &EffectiveFormatter {
        &self.block
    }

    /// The merged transaction formatter.
    pub fn transaction(&self) -> &EffectiveFormatter {
        &self.transaction
    }

    /// The merged outbound transaction request formatter.
    pub fn transaction_request(&self) -> &EffectiveFormatter {
        &self.transaction_request
    }
}

/// Builder for [`ChainFormatters`]. Each registration is validated against
/// the canonical field registry of its entity kind immediately, so a
/// misconfigured chain fails at construction time rather than per call.
#[derive(Clone, Copy, Debug)]
pub struct ChainFormattersBuilder {
    base: BaseFormatters,
    block: FormatterDescriptor,
    transaction: FormatterDescriptor,
    transaction_request: FormatterDescriptor,
}

impl ChainFormattersBuilder {
    /// Registers the chain's block descriptor.
    pub fn with_block(mut self, descriptor: FormatterDescriptor) -> Result<Self, RegistrationError> {
        validate(EntityKind::Block, self.base.block.fields, &descriptor)?;
        self.block = descriptor;
        Ok(self)
    }

    /// Registers the chain's transaction descriptor.
    pub fn with_transaction(
        mut self,
        descriptor: FormatterDescriptor,
    ) -> Result<Self, RegistrationError> {
        validate(EntityKind::Transaction, self.base.transaction.fields, &descriptor)?;
        self.transaction = descriptor;
        Ok(self)
    }

    /// Registers the chain's outbound transaction request descriptor.
    pub fn with_transaction_request(
        mut self,
        descriptor: FormatterDescriptor,
    ) -> Result<Self, RegistrationError> {
        validate(
            EntityKind::TransactionRequest,
            self.base.transaction_request.fields,
            &descriptor,
        )?;
        self.transaction_request = descriptor;
        Ok(self)
    }

    /// Finishes the registry.
    pub fn build(self) -> ChainFormatters {
        let effective = |kind, base: EntityFormatter, descriptor| EffectiveFormatter {
            kind,
            base: base.format,
            descriptor,
        };

        ChainFormatters {
            block: effective(EntityKind::Block, self.base.block, self.block),
            transaction: effective(EntityKind::Transaction, self.base.transaction, self.transaction),
            transaction_request: effective(
                EntityKind::TransactionRequest,
                self.base.transaction_request,
                self.transaction_request,
            ),
        }
    }
}

fn validate(
    kind: EntityKind,
    fields: &'static [FieldDef],
    descriptor: &FormatterDescriptor,
) -> Result<(), RegistrationError> {
    for field in descriptor.exclude {
        if !fields.iter().any(|canonical| canonical.name == *field) {
            return Err(RegistrationError::UnknownExcludedField { kind, field });
        }
    }

    for provided in descriptor.provides {
        if descriptor.exclude.contains(&provided.name) {
            // Allowed: exclusion filters only the base output, so the
            // override reinstates the field under new semantics.
            log::warn!(
                "chain override for {kind} reinstates excluded field `{}`",
                provided.name
            );
            continue;
        }

        if let Some(canonical) = fields.iter().find(|canonical| canonical.name == provided.name) {
            if canonical.kind != provided.kind {
                return Err(RegistrationError::ConflictingOverride {
                    kind,
                    field: provided.name,
                    declared: provided.kind,
                    canonical: canonical.kind,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use alloy_primitives::U256;

    use super::*;
    use crate::field::FieldKind;

    const TEST_FIELDS: &[FieldDef] = &[
        FieldDef::new("blockHash", FieldKind::Hash),
        FieldDef::new("blockNumber", FieldKind::Quantity),
        FieldDef::new("transactionIndex", FieldKind::Quantity),
        FieldDef::new("gasPrice", FieldKind::Quantity),
    ];

    const PROVIDES_GAS_PRICE: &[FieldDef] = &[FieldDef::new("gasPrice", FieldKind::Quantity)];
    const PROVIDES_GAS_PRICE_AS_ADDRESS: &[FieldDef] =
        &[FieldDef::new("gasPrice", FieldKind::Address)];

    fn base_format(raw: &RawEntity) -> Result<FieldMap, FormatError> {
        let mut result = FieldMap::new();
        if raw.contains_key("gasPrice") {
            result.insert("gasPrice", FieldValue::Quantity(U256::from(1_u64)));
        }
        Ok(result)
    }

    fn base_formatters() -> BaseFormatters {
        let entity = EntityFormatter {
            fields: TEST_FIELDS,
            format: base_format,
        };
        BaseFormatters {
            block: entity,
            transaction: entity,
            transaction_request: entity,
        }
    }

    fn override_format(_raw: &RawEntity) -> Result<FieldMap, FormatError> {
        let mut result = FieldMap::new();
        result.insert("gasPrice", FieldValue::Quantity(U256::from(2_u64)));
        Ok(result)
    }

    #[test]
    fn override_wins_collision() -> anyhow::Result<()> {
        let descriptor = FormatterDescriptor {
            exclude: &[],
            provides: PROVIDES_GAS_PRICE,
            format: override_format,
        };
        let formatters = ChainFormatters::builder(base_formatters())
            .with_block(descriptor)?
            .build();

        let raw: RawEntity = serde_json::from_str(r#"{"gasPrice": "0x1"}"#)?;
        let formatted = formatters.block().format(&raw)?;

        assert_eq!(
            formatted.get("gasPrice"),
            Some(&FieldValue::Quantity(U256::from(2_u64)))
        );

        Ok(())
    }

    #[test]
    fn excluded_field_reinstated_by_override() -> anyhow::Result<()> {
        let descriptor = FormatterDescriptor {
            exclude: &["gasPrice"],
            provides: PROVIDES_GAS_PRICE,
            format: override_format,
        };
        let formatters = ChainFormatters::builder(base_formatters())
            .with_block(descriptor)?
            .build();

        let raw: RawEntity = serde_json::from_str(r#"{"gasPrice": "0x1"}"#)?;
        let formatted = formatters.block().format(&raw)?;

        // Exclusion filters the base output only; the override's value
        // survives.
        assert_eq!(
            formatted.get("gasPrice"),
            Some(&FieldValue::Quantity(U256::from(2_u64)))
        );

        Ok(())
    }

    #[test]
    fn unknown_excluded_field_is_rejected() {
        let descriptor = FormatterDescriptor {
            exclude: &["difficulty"],
            provides: &[],
            format: override_format,
        };
        let error = ChainFormatters::builder(base_formatters())
            .with_block(descriptor)
            .expect_err("registration should fail");

        assert_eq!(
            error,
            RegistrationError::UnknownExcludedField {
                kind: EntityKind::Block,
                field: "difficulty",
            }
        );
    }

    #[test]
    fn kind_conflict_is_rejected() {
        let descriptor = FormatterDescriptor {
            exclude: &[],
            provides: PROVIDES_GAS_PRICE_AS_ADDRESS,
            format: override_format,
        };
        let error = ChainFormatters::builder(base_formatters())
            .with_transaction(descriptor)
            .expect_err("registration should fail");

        assert_eq!(
            error,
            RegistrationError::ConflictingOverride {
                kind: EntityKind::Transaction,
                field: "gasPrice",
                declared: FieldKind::Address,
                canonical: FieldKind::Quantity,
            }
        );
    }

    #[test]
    fn pending_transaction_forces_block_association_to_null() -> anyhow::Result<()> {
        let formatters = ChainFormatters::builder(base_formatters()).build();

        let raw: RawEntity = serde_json::from_str(r#"{"gasPrice": "0x1", "blockHash": null}"#)?;
        let formatted = formatters.transaction().format(&raw)?;

        for field in BLOCK_ASSOCIATION_FIELDS {
            assert_eq!(formatted.get(field), Some(&FieldValue::Null));
        }

        // A payload that omits `blockHash` entirely is pending too.
        let raw: RawEntity = serde_json::from_str(r#"{"gasPrice": "0x1"}"#)?;
        let formatted = formatters.transaction().format(&raw)?;

        for field in BLOCK_ASSOCIATION_FIELDS {
            assert_eq!(formatted.get(field), Some(&FieldValue::Null));
        }

        Ok(())
    }
}
