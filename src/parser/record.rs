use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::LoadError;

pub const METADATA_ANCHOR: &str = "drug-meta";

/// JSON key holding a bond card's name.
pub const BOND_NAME_KEY: &str = "Molecule name";

/// Label → value pairs of one header section, in document order.
pub type SectionFields = IndexMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Identification,
    Pharmacology,
    Interactions,
    Products,
    Categories,
    ChemicalIdentifiers,
    References,
    ClinicalTrials,
    Pharmacoeconomics,
    Properties,
}

impl Section {
    pub const ALL: [Section; 10] = [
        Section::Identification,
        Section::Pharmacology,
        Section::Interactions,
        Section::Products,
        Section::Categories,
        Section::ChemicalIdentifiers,
        Section::References,
        Section::ClinicalTrials,
        Section::Pharmacoeconomics,
        Section::Properties,
    ];

    /// Heading as shown on the page; also the key in the JSON document.
    pub fn name(self) -> &'static str {
        match self {
            Section::Identification => "Identification",
            Section::Pharmacology => "Pharmacology",
            Section::Interactions => "Interactions",
            Section::Products => "Products",
            Section::Categories => "Categories",
            Section::ChemicalIdentifiers => "Chemical Identifiers",
            Section::References => "References",
            Section::ClinicalTrials => "Clinical Trials",
            Section::Pharmacoeconomics => "Pharmacoeconomics",
            Section::Properties => "Properties",
        }
    }

    pub fn anchor(self) -> &'static str {
        match self {
            Section::Identification => "identification-header",
            Section::Pharmacology => "pharmacology-header",
            Section::Interactions => "interactions-header",
            Section::Products => "products-header",
            Section::Categories => "categories-header",
            Section::ChemicalIdentifiers => "chemical-identifiers-header",
            Section::References => "references-header",
            Section::ClinicalTrials => "clinical-trials-header",
            Section::Pharmacoeconomics => "pharmacoeconomics-header",
            Section::Properties => "properties-header",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondKind {
    Targets,
    Enzymes,
    Carriers,
    Transporters,
}

impl BondKind {
    pub const ALL: [BondKind; 4] = [
        BondKind::Targets,
        BondKind::Enzymes,
        BondKind::Carriers,
        BondKind::Transporters,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BondKind::Targets => "Targets",
            BondKind::Enzymes => "Enzymes",
            BondKind::Carriers => "Carriers",
            BondKind::Transporters => "Transporters",
        }
    }

    /// Id of the container element holding this kind's bond cards.
    pub fn anchor(self) -> &'static str {
        match self {
            BondKind::Targets => "targets",
            BondKind::Enzymes => "enzymes",
            BondKind::Carriers => "carriers",
            BondKind::Transporters => "transporters",
        }
    }

    /// Discriminator stored in `drug_bond.bond_type`.
    pub fn bond_type(self) -> &'static str {
        match self {
            BondKind::Targets => "target",
            BondKind::Enzymes => "enzyme",
            BondKind::Carriers => "carrier",
            BondKind::Transporters => "transporter",
        }
    }
}

/// A bond card value: plain text, or the entries of a nested list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
}

/// One target/enzyme/carrier/transporter card. Serialized flat:
/// `{"Molecule name": ..., "<label>": <value>, ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondRecord {
    #[serde(rename = "Molecule name")]
    pub name: String,
    #[serde(flatten)]
    pub fields: IndexMap<String, FieldValue>,
}

/// Everything extracted from one drug page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "RecordDocument", from = "RecordDocument")]
pub struct DrugRecord {
    pub sections: IndexMap<Section, SectionFields>,
    pub bonds: IndexMap<BondKind, Vec<BondRecord>>,
    pub metadata: String,
}

impl DrugRecord {
    pub fn section(&self, section: Section) -> Option<&SectionFields> {
        self.sections.get(&section)
    }

    pub fn bonds(&self, kind: BondKind) -> &[BondRecord] {
        self.bonds.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    /// Display name of the drug, taken from `Identification.Name`.
    pub fn drug_name(&self) -> Result<&str, LoadError> {
        self.section(Section::Identification)
            .and_then(|fields| fields.get("Name"))
            .map(String::as_str)
            .ok_or(LoadError::MissingField {
                section: Section::Identification.name(),
                field: "Name",
            })
    }
}

// ── JSON document shape ──

/// On-disk layout: ten section objects, four bond arrays, then metadata.
#[derive(Serialize, Deserialize)]
struct RecordDocument {
    #[serde(rename = "Identification")]
    identification: SectionFields,
    #[serde(rename = "Pharmacology")]
    pharmacology: SectionFields,
    #[serde(rename = "Interactions")]
    interactions: SectionFields,
    #[serde(rename = "Products")]
    products: SectionFields,
    #[serde(rename = "Categories")]
    categories: SectionFields,
    #[serde(rename = "Chemical Identifiers")]
    chemical_identifiers: SectionFields,
    #[serde(rename = "References")]
    references: SectionFields,
    #[serde(rename = "Clinical Trials")]
    clinical_trials: SectionFields,
    #[serde(rename = "Pharmacoeconomics")]
    pharmacoeconomics: SectionFields,
    #[serde(rename = "Properties")]
    properties: SectionFields,
    #[serde(rename = "Targets")]
    targets: Vec<BondRecord>,
    #[serde(rename = "Enzymes")]
    enzymes: Vec<BondRecord>,
    #[serde(rename = "Carriers")]
    carriers: Vec<BondRecord>,
    #[serde(rename = "Transporters")]
    transporters: Vec<BondRecord>,
    metadata: String,
}

impl From<DrugRecord> for RecordDocument {
    fn from(record: DrugRecord) -> Self {
        let DrugRecord {
            mut sections,
            mut bonds,
            metadata,
        } = record;
        let mut section = |s: Section| sections.shift_remove(&s).unwrap_or_default();
        let identification = section(Section::Identification);
        let pharmacology = section(Section::Pharmacology);
        let interactions = section(Section::Interactions);
        let products = section(Section::Products);
        let categories = section(Section::Categories);
        let chemical_identifiers = section(Section::ChemicalIdentifiers);
        let references = section(Section::References);
        let clinical_trials = section(Section::ClinicalTrials);
        let pharmacoeconomics = section(Section::Pharmacoeconomics);
        let properties = section(Section::Properties);
        let mut bond = |k: BondKind| bonds.shift_remove(&k).unwrap_or_default();

        RecordDocument {
            identification,
            pharmacology,
            interactions,
            products,
            categories,
            chemical_identifiers,
            references,
            clinical_trials,
            pharmacoeconomics,
            properties,
            targets: bond(BondKind::Targets),
            enzymes: bond(BondKind::Enzymes),
            carriers: bond(BondKind::Carriers),
            transporters: bond(BondKind::Transporters),
            metadata,
        }
    }
}

impl From<RecordDocument> for DrugRecord {
    fn from(doc: RecordDocument) -> Self {
        let sections = IndexMap::from([
            (Section::Identification, doc.identification),
            (Section::Pharmacology, doc.pharmacology),
            (Section::Interactions, doc.interactions),
            (Section::Products, doc.products),
            (Section::Categories, doc.categories),
            (Section::ChemicalIdentifiers, doc.chemical_identifiers),
            (Section::References, doc.references),
            (Section::ClinicalTrials, doc.clinical_trials),
            (Section::Pharmacoeconomics, doc.pharmacoeconomics),
            (Section::Properties, doc.properties),
        ]);
        let bonds = IndexMap::from([
            (BondKind::Targets, doc.targets),
            (BondKind::Enzymes, doc.enzymes),
            (BondKind::Carriers, doc.carriers),
            (BondKind::Transporters, doc.transporters),
        ]);
        DrugRecord {
            sections,
            bonds,
            metadata: doc.metadata,
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DrugRecord {
        let mut sections: IndexMap<Section, SectionFields> = Section::ALL
            .iter()
            .map(|s| (*s, SectionFields::new()))
            .collect();
        sections[&Section::Identification].insert("Name".into(), "Warfarin".into());
        sections[&Section::Identification].insert("Type".into(), "Small Molecule".into());

        let mut fields = IndexMap::new();
        fields.insert("Kind".to_string(), FieldValue::Scalar("Protein".into()));
        fields.insert(
            "Actions".to_string(),
            FieldValue::List(vec!["Inhibitor".into(), "Antagonist".into()]),
        );
        let mut bonds: IndexMap<BondKind, Vec<BondRecord>> =
            BondKind::ALL.iter().map(|k| (*k, Vec::new())).collect();
        bonds[&BondKind::Targets].push(BondRecord {
            name: "Vitamin K epoxide reductase".into(),
            fields,
        });

        DrugRecord {
            sections,
            bonds,
            metadata: "Created at 2005-06-13".into(),
        }
    }

    #[test]
    fn document_key_order() {
        let json = serde_json::to_string(&sample()).unwrap();
        let document: IndexMap<String, serde_json::Value> = serde_json::from_str(&json).unwrap();
        let keys: Vec<&str> = document.keys().map(String::as_str).collect();
        let mut expected: Vec<&str> = Section::ALL.iter().map(|s| s.name()).collect();
        expected.extend(BondKind::ALL.iter().map(|k| k.name()));
        expected.push("metadata");
        assert_eq!(keys, expected);
    }

    #[test]
    fn bond_fields_are_flattened() {
        let value = serde_json::to_value(&sample().bonds(BondKind::Targets)[0]).unwrap();
        assert_eq!(value["Molecule name"], "Vitamin K epoxide reductase");
        assert_eq!(value["Kind"], "Protein");
        assert_eq!(value["Actions"], serde_json::json!(["Inhibitor", "Antagonist"]));
        assert!(value.get("fields").is_none());
    }

    #[test]
    fn document_reads_back_equal() {
        let record = sample();
        let json = serde_json::to_string(&record).unwrap();
        let back: DrugRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
        let actions = &back.bonds(BondKind::Targets)[0].fields["Actions"];
        assert!(matches!(actions, FieldValue::List(items) if items.len() == 2));
    }

    #[test]
    fn document_without_bond_key_is_rejected() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value.as_object_mut().unwrap().remove("Carriers");
        assert!(serde_json::from_value::<DrugRecord>(value).is_err());
    }

    #[test]
    fn drug_name_requires_identification_name() {
        let mut record = sample();
        assert_eq!(record.drug_name(), Ok("Warfarin"));
        record.sections[&Section::Identification].shift_remove("Name");
        assert_eq!(
            record.drug_name(),
            Err(LoadError::MissingField {
                section: "Identification",
                field: "Name"
            })
        );
    }
}
