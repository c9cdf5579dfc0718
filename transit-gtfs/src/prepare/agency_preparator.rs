use serde::Serialize;
use transit_core::collection::NetworkCollection;
use transit_core::model::Agency;

use super::field_ops::{field, owned_field, RowRef};
use super::{ImportCandidate, Preparation};
use crate::feed::{FeedError, FeedFile, FeedRow, RowSource};

/// acronym given to the agency of a single-agency feed without agency_id
pub const DEFAULT_AGENCY_ID: &str = "AGENCY";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeedAgency {
    pub agency_id: String,
    pub name: String,
    pub url: Option<String>,
    pub timezone: Option<String>,
    pub lang: Option<String>,
    pub phone: Option<String>,
    pub fare_url: Option<String>,
    pub email: Option<String>,
}

/// existing agencies imported from, or named after, this feed agency.
pub fn matching_agencies(existing: &NetworkCollection<Agency>, agency_id: &str) -> Vec<String> {
    existing
        .features()
        .filter(|a| {
            a.acronym == agency_id
                || a.gtfs.as_ref().map(|g| g.agency_id.as_str()) == Some(agency_id)
        })
        .map(|a| a.id.clone())
        .collect()
}

pub fn prepare_agencies(
    source: &dyn RowSource,
    existing: &NetworkCollection<Agency>,
) -> Result<Preparation<ImportCandidate<FeedAgency>>, FeedError> {
    let mut rows: Vec<(FeedRow, usize)> = vec![];
    let found = source.read_rows(FeedFile::Agency, &mut |row, n| rows.push((row, n)))?;
    if !found {
        return Err(FeedError::MissingFile(FeedFile::Agency));
    }
    let single_agency = rows.len() == 1;

    let mut result = Preparation::default();
    for (row, row_number) in rows.iter() {
        let at = RowRef::new(FeedFile::Agency, *row_number);
        let agency_id = match field(row, "agency_id") {
            Some(id) => id.to_string(),
            None if single_agency => String::from(DEFAULT_AGENCY_ID),
            None => {
                log::warn!("{} row {row_number} has no agency_id", FeedFile::Agency);
                result.warnings.push(at.missing("agency_id"));
                continue;
            }
        };
        if result
            .candidates
            .iter()
            .any(|c: &ImportCandidate<FeedAgency>| c.data.agency_id == agency_id)
        {
            result.warnings.push(at.invalid("agency_id", &agency_id));
            continue;
        }
        let data = FeedAgency {
            name: owned_field(row, "agency_name").unwrap_or_else(|| agency_id.clone()),
            url: owned_field(row, "agency_url"),
            timezone: owned_field(row, "agency_timezone"),
            lang: owned_field(row, "agency_lang"),
            phone: owned_field(row, "agency_phone"),
            fare_url: owned_field(row, "agency_fare_url"),
            email: owned_field(row, "agency_email"),
            agency_id,
        };
        let existing_ids = matching_agencies(existing, &data.agency_id);
        result.candidates.push(ImportCandidate::new(data, existing_ids));
    }
    log::debug!("prepared {} agencies", result.candidates.len());
    Ok(result)
}

#[cfg(test)]
mod test {
    use transit_core::collection::NetworkCollection;
    use transit_core::model::{Agency, GtfsAgencyData};

    use super::{prepare_agencies, DEFAULT_AGENCY_ID};
    use crate::feed::{FeedFile, InMemoryRowSource};
    use crate::prepare::Disposition;

    #[test]
    fn test_single_agency_without_id() {
        let source = InMemoryRowSource::new().with_file(
            FeedFile::Agency,
            "agency_name,agency_url,agency_timezone\nCity Transit,https://transit.example,America/Montreal\n",
        );
        let prepared = prepare_agencies(&source, &NetworkCollection::default()).unwrap();
        assert_eq!(prepared.candidates.len(), 1);
        let candidate = &prepared.candidates[0];
        assert_eq!(candidate.data.agency_id, DEFAULT_AGENCY_ID);
        assert_eq!(candidate.data.timezone.as_deref(), Some("America/Montreal"));
        assert_eq!(candidate.disposition, Disposition::Create);
    }

    #[test]
    fn test_multi_agency_without_id_is_rejected() {
        let source = InMemoryRowSource::new().with_file(
            FeedFile::Agency,
            "agency_id,agency_name\n,First\nB,Second\n",
        );
        let prepared = prepare_agencies(&source, &NetworkCollection::default()).unwrap();
        assert_eq!(prepared.candidates.len(), 1);
        assert_eq!(prepared.warnings.len(), 1);
    }

    #[test]
    fn test_matches_existing_by_gtfs_id() {
        let existing = NetworkCollection::new(vec![Agency {
            id: String::from("a1"),
            acronym: String::from("CT"),
            name: String::from("City Transit"),
            description: None,
            color: String::from("#0086FF"),
            gtfs: Some(GtfsAgencyData {
                agency_id: String::from("1"),
                ..Default::default()
            }),
        }]);
        let source = InMemoryRowSource::new()
            .with_file(FeedFile::Agency, "agency_id,agency_name\n1,City Transit\n");
        let prepared = prepare_agencies(&source, &existing).unwrap();
        assert_eq!(prepared.candidates[0].existing_ids, vec![String::from("a1")]);
        assert_eq!(prepared.candidates[0].disposition.target_id(), Some("a1"));
    }

    #[test]
    fn test_missing_file() {
        let source = InMemoryRowSource::new();
        assert!(prepare_agencies(&source, &NetworkCollection::default()).is_err());
    }
}
