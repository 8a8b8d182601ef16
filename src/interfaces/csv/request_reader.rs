use crate::application::gate::LedgerRequest;
use crate::error::{LedgerError, Result};
use std::io::Read;

/// Reads extracted-entity requests from a CSV source.
///
/// Wraps `csv::Reader` and yields `Result<LedgerRequest>` lazily, so large
/// batches stream without loading everything into memory. Expected columns:
/// `owner,customer,amount,kind,transcript,audio_ref,confidence`; empty
/// optional fields deserialize to `None` and are judged by the ingest gate,
/// not here.
pub struct RequestReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> RequestReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn requests(self) -> impl Iterator<Item = Result<LedgerRequest>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LedgerError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transaction::TransactionKind;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_valid_stream() {
        let data = "owner,customer,amount,kind,transcript,audio_ref,confidence\n\
                    0b0e5e4e-52e7-4d27-8b24-1df17ad8a3c5,Ramesh,50.00,PAYMENT,\"ramesh ne 50 diye\",,0.9\n\
                    0b0e5e4e-52e7-4d27-8b24-1df17ad8a3c5,Sita,200,credit,,audio/s1.wav,0.95";
        let reader = RequestReader::new(data.as_bytes());
        let requests: Vec<Result<LedgerRequest>> = reader.requests().collect();

        assert_eq!(requests.len(), 2);
        let first = requests[0].as_ref().unwrap();
        assert_eq!(first.customer_name, "Ramesh");
        assert_eq!(first.amount, Some(dec!(50.00)));
        assert_eq!(first.kind, Some(TransactionKind::Payment));
        assert_eq!(first.audio_ref, None);
        assert_eq!(first.confidence, Some(0.9));

        let second = requests[1].as_ref().unwrap();
        assert_eq!(second.kind, Some(TransactionKind::Credit));
        assert_eq!(second.audio_ref.as_deref(), Some("audio/s1.wav"));
    }

    #[test]
    fn test_reader_missing_optionals() {
        let data = "owner,customer,amount,kind,transcript,audio_ref,confidence\n\
                    0b0e5e4e-52e7-4d27-8b24-1df17ad8a3c5,Ramesh,,,,,";
        let reader = RequestReader::new(data.as_bytes());
        let requests: Vec<Result<LedgerRequest>> = reader.requests().collect();

        let request = requests[0].as_ref().unwrap();
        assert_eq!(request.amount, None);
        assert_eq!(request.kind, None);
        assert_eq!(request.confidence, None);
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = "owner,customer,amount,kind,transcript,audio_ref,confidence\n\
                    not-a-uuid,Ramesh,50,PAYMENT,,,0.9";
        let reader = RequestReader::new(data.as_bytes());
        let requests: Vec<Result<LedgerRequest>> = reader.requests().collect();

        assert!(requests[0].is_err());
    }
}
