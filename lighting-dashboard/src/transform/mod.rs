use lighting_client::domain::RecordDraft;

use crate::pipeline::{Envelope, PipelineError, Transform};

pub const MIN_YEAR: i32 = 2000;
pub const MAX_YEAR: i32 = 2100;
pub const MAX_NOTES_CHARS: usize = 1000;

/// A draft that cannot be stored. Messages are shown to administrators as is.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("O mês deve estar entre 1 e 12.")]
    Month(u32),
    #[error("O ano deve estar entre 2000 e 2100.")]
    Year(i32),
    #[error("O campo '{0}' deve ser um número maior ou igual a zero.")]
    NegativeOrInvalid(&'static str),
    #[error("As observações devem ter no máximo 1000 caracteres.")]
    NotesTooLong(usize),
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NegativeOrInvalid(field))
    }
}

fn optional_non_negative(field: &'static str, value: Option<f64>) -> Result<(), ValidationError> {
    value.map_or(Ok(()), |v| non_negative(field, v))
}

/// Pure validation of a `RecordDraft`.
///
/// Rules:
/// - month in 1..=12 and year in [2000, 2100].
/// - amounts, consumption and unit prices are finite and non-negative.
/// - notes hold at most 1000 characters.
///
/// Delinquency rates are signed and only need to be finite.
pub fn validate_draft(draft: &RecordDraft) -> Result<(), ValidationError> {
    if !draft.period.is_valid_month() {
        return Err(ValidationError::Month(draft.period.month));
    }
    if !(MIN_YEAR..=MAX_YEAR).contains(&draft.period.year) {
        return Err(ValidationError::Year(draft.period.year));
    }

    non_negative("consumo", draft.consumption_kwh)?;
    non_negative("valor faturado", draft.amount_billed)?;
    non_negative("valor pago", draft.amount_paid)?;
    non_negative("preço da bandeira", draft.tariff_flag.extra_unit_price())?;
    optional_non_negative("valor da bandeira", draft.flag_amount_billed)?;
    optional_non_negative("tarifa de energia", draft.unit_price_energy)?;
    optional_non_negative("tarifa de distribuição", draft.unit_price_distribution)?;
    optional_non_negative("COSIP faturada", draft.levy.billed)?;
    optional_non_negative("COSIP arrecadada", draft.levy.collected)?;
    if draft.levy.customer_count.is_some_and(|c| c < 0) {
        return Err(ValidationError::NegativeOrInvalid("quantidade de contribuintes"));
    }
    if draft.delinquency_rate.is_some_and(|r| !r.is_finite()) {
        return Err(ValidationError::NegativeOrInvalid("inadimplência"));
    }

    if let Some(notes) = &draft.notes {
        let chars = notes.chars().count();
        if chars > MAX_NOTES_CHARS {
            return Err(ValidationError::NotesTooLong(chars));
        }
    }

    Ok(())
}

/// Import-pipeline stage wrapping [`validate_draft`].
#[derive(Clone, Default)]
pub struct DraftValidation;

#[async_trait::async_trait]
impl Transform<RecordDraft, RecordDraft> for DraftValidation {
    async fn apply(&self, input: Envelope<RecordDraft>) -> Result<Envelope<RecordDraft>, PipelineError> {
        match validate_draft(&input.payload) {
            Ok(()) => Ok(input),
            Err(e) => {
                metrics::counter!("validation_record_draft_rejected_total").increment(1);
                Err(PipelineError::Transform(format!("{}: {e}", input.payload.period)))
            }
        }
    }
}
