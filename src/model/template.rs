//! The QRDA Category III template catalog.
//!
//! Each XML element the converter cares about announces itself with one or more
//! `<templateId root="..." extension="..."/>` children. [`TemplateId`] is the closed
//! set of identities the pipeline understands; decoders, encoders and validators are
//! all keyed by it.

use std::fmt;

/// A known template identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TemplateId {
    /// Synthetic container for the document root; never appears in XML.
    Placeholder,

    // =========================================================================
    // Document and sections
    // =========================================================================
    /// QRDA Category III report - CMS
    ClinicalDocument,
    /// Advancing Care Information section
    AciSection,
    /// Improvement Activities section
    IaSection,
    /// QRDA Category III measure section - CMS
    MeasureSection,
    /// Reporting parameters act (performance period)
    ReportingParametersAct,

    // =========================================================================
    // Advancing Care Information
    // =========================================================================
    /// ACI numerator/denominator type measure reference and results
    AciNumeratorDenominator,
    /// ACI numerator
    AciNumerator,
    /// ACI denominator
    AciDenominator,
    /// ACI measure performed reference and results
    AciMeasurePerformed,

    // =========================================================================
    // Improvement Activities
    // =========================================================================
    /// Improvement activity performed reference and results
    IaMeasure,
    /// Measure performed (yes/no observation)
    MeasurePerformed,

    // =========================================================================
    // Quality measures
    // =========================================================================
    /// Measure reference and results - CMS
    MeasureReferenceResults,
    /// Measure data - CMS (one population)
    MeasureData,
    /// Aggregate count
    AggregateCount,

    // =========================================================================
    // Present in valid documents but carrying nothing the QPP schema needs
    // =========================================================================
    /// US Realm header
    UsRealmHeader,
    /// QRDA Category III report (base template)
    QrdaCategoryIiiReport,
    /// QDM-based measure section
    MeasureSectionQdm,
    /// QRDA Category III measure section (base template)
    QrdaMeasureSection,
    /// eMeasure reference
    MeasureReference,
    /// Performance rate for proportion measure
    PerformanceRate,
    /// Reporting stratum
    ReportingStratum,
    /// Sex supplemental data element
    SexSupplementalData,
    /// Ethnicity supplemental data element
    EthnicitySupplementalData,
    /// Race supplemental data element
    RaceSupplementalData,
    /// Payer supplemental data element
    PayerSupplementalData,
}

impl TemplateId {
    /// Every catalog entry, in declaration order.
    pub const ALL: [TemplateId; 26] = [
        TemplateId::Placeholder,
        TemplateId::ClinicalDocument,
        TemplateId::AciSection,
        TemplateId::IaSection,
        TemplateId::MeasureSection,
        TemplateId::ReportingParametersAct,
        TemplateId::AciNumeratorDenominator,
        TemplateId::AciNumerator,
        TemplateId::AciDenominator,
        TemplateId::AciMeasurePerformed,
        TemplateId::IaMeasure,
        TemplateId::MeasurePerformed,
        TemplateId::MeasureReferenceResults,
        TemplateId::MeasureData,
        TemplateId::AggregateCount,
        TemplateId::UsRealmHeader,
        TemplateId::QrdaCategoryIiiReport,
        TemplateId::MeasureSectionQdm,
        TemplateId::QrdaMeasureSection,
        TemplateId::MeasureReference,
        TemplateId::PerformanceRate,
        TemplateId::ReportingStratum,
        TemplateId::SexSupplementalData,
        TemplateId::EthnicitySupplementalData,
        TemplateId::RaceSupplementalData,
        TemplateId::PayerSupplementalData,
    ];

    /// The `root` OID of the template. Empty for [`TemplateId::Placeholder`].
    pub fn root(&self) -> &'static str {
        match self {
            TemplateId::Placeholder => "",
            TemplateId::ClinicalDocument => "2.16.840.1.113883.10.20.27.1.2",
            TemplateId::AciSection => "2.16.840.1.113883.10.20.27.2.5",
            TemplateId::IaSection => "2.16.840.1.113883.10.20.27.2.4",
            TemplateId::MeasureSection => "2.16.840.1.113883.10.20.27.2.3",
            TemplateId::ReportingParametersAct => "2.16.840.1.113883.10.20.17.3.8",
            TemplateId::AciNumeratorDenominator => "2.16.840.1.113883.10.20.27.3.28",
            TemplateId::AciNumerator => "2.16.840.1.113883.10.20.27.3.31",
            TemplateId::AciDenominator => "2.16.840.1.113883.10.20.27.3.32",
            TemplateId::AciMeasurePerformed => "2.16.840.1.113883.10.20.27.3.29",
            TemplateId::IaMeasure => "2.16.840.1.113883.10.20.27.3.33",
            TemplateId::MeasurePerformed => "2.16.840.1.113883.10.20.27.3.27",
            TemplateId::MeasureReferenceResults => "2.16.840.1.113883.10.20.27.3.17",
            TemplateId::MeasureData => "2.16.840.1.113883.10.20.27.3.16",
            TemplateId::AggregateCount => "2.16.840.1.113883.10.20.27.3.3",
            TemplateId::UsRealmHeader => "2.16.840.1.113883.10.20.22.1.1",
            TemplateId::QrdaCategoryIiiReport => "2.16.840.1.113883.10.20.27.1.1",
            TemplateId::MeasureSectionQdm => "2.16.840.1.113883.10.20.24.2.2",
            TemplateId::QrdaMeasureSection => "2.16.840.1.113883.10.20.27.2.1",
            TemplateId::MeasureReference => "2.16.840.1.113883.10.20.24.3.98",
            TemplateId::PerformanceRate => "2.16.840.1.113883.10.20.27.3.30",
            TemplateId::ReportingStratum => "2.16.840.1.113883.10.20.27.3.4",
            TemplateId::SexSupplementalData => "2.16.840.1.113883.10.20.27.3.6",
            TemplateId::EthnicitySupplementalData => "2.16.840.1.113883.10.20.27.3.7",
            TemplateId::RaceSupplementalData => "2.16.840.1.113883.10.20.27.3.8",
            TemplateId::PayerSupplementalData => "2.16.840.1.113883.10.20.27.3.18",
        }
    }

    /// The `extension` (template version), if the template is versioned.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            TemplateId::ClinicalDocument => Some("2017-07-01"),
            TemplateId::AciSection
            | TemplateId::IaSection
            | TemplateId::MeasureSection
            | TemplateId::AciNumeratorDenominator
            | TemplateId::IaMeasure
            | TemplateId::QrdaMeasureSection => Some("2017-06-01"),
            TemplateId::AciNumerator
            | TemplateId::AciDenominator
            | TemplateId::AciMeasurePerformed
            | TemplateId::MeasurePerformed
            | TemplateId::PerformanceRate
            | TemplateId::SexSupplementalData
            | TemplateId::EthnicitySupplementalData
            | TemplateId::RaceSupplementalData => Some("2016-09-01"),
            TemplateId::MeasureReferenceResults
            | TemplateId::MeasureData
            | TemplateId::QrdaCategoryIiiReport => Some("2016-11-01"),
            TemplateId::UsRealmHeader => Some("2015-08-01"),
            TemplateId::PayerSupplementalData => Some("2016-02-01"),
            TemplateId::Placeholder
            | TemplateId::ReportingParametersAct
            | TemplateId::AggregateCount
            | TemplateId::MeasureSectionQdm
            | TemplateId::MeasureReference
            | TemplateId::ReportingStratum => None,
        }
    }

    /// Stable upper-case name used in diagnostics and metadata records.
    pub fn name(&self) -> &'static str {
        match self {
            TemplateId::Placeholder => "PLACEHOLDER",
            TemplateId::ClinicalDocument => "CLINICAL_DOCUMENT",
            TemplateId::AciSection => "ACI_SECTION",
            TemplateId::IaSection => "IA_SECTION",
            TemplateId::MeasureSection => "MEASURE_SECTION_V2",
            TemplateId::ReportingParametersAct => "REPORTING_PARAMETERS_ACT",
            TemplateId::AciNumeratorDenominator => "ACI_NUMERATOR_DENOMINATOR",
            TemplateId::AciNumerator => "ACI_NUMERATOR",
            TemplateId::AciDenominator => "ACI_DENOMINATOR",
            TemplateId::AciMeasurePerformed => "ACI_MEASURE_PERFORMED",
            TemplateId::IaMeasure => "IA_MEASURE",
            TemplateId::MeasurePerformed => "MEASURE_PERFORMED",
            TemplateId::MeasureReferenceResults => "MEASURE_REFERENCE_RESULTS_CMS_V2",
            TemplateId::MeasureData => "MEASURE_DATA_CMS_V2",
            TemplateId::AggregateCount => "ACI_AGGREGATE_COUNT",
            TemplateId::UsRealmHeader => "US_REALM_HEADER",
            TemplateId::QrdaCategoryIiiReport => "QRDA_CATEGORY_III_REPORT",
            TemplateId::MeasureSectionQdm => "MEASURE_SECTION",
            TemplateId::QrdaMeasureSection => "QRDA_MEASURE_SECTION",
            TemplateId::MeasureReference => "MEASURE_REFERENCE",
            TemplateId::PerformanceRate => "PERFORMANCE_RATE_PROPORTION_MEASURE",
            TemplateId::ReportingStratum => "REPORTING_STRATUM",
            TemplateId::SexSupplementalData => "SEX_SUPPLEMENTAL_DATA_ELEMENT",
            TemplateId::EthnicitySupplementalData => "ETHNICITY_SUPPLEMENTAL_DATA_ELEMENT",
            TemplateId::RaceSupplementalData => "RACE_SUPPLEMENTAL_DATA_ELEMENT",
            TemplateId::PayerSupplementalData => "PAYER_SUPPLEMENTAL_DATA_ELEMENT",
        }
    }

    /// Templates that are expected in valid documents but map to nothing in QPP JSON.
    pub fn is_ignorable(&self) -> bool {
        matches!(
            self,
            TemplateId::UsRealmHeader
                | TemplateId::QrdaCategoryIiiReport
                | TemplateId::MeasureSectionQdm
                | TemplateId::QrdaMeasureSection
                | TemplateId::MeasureReference
                | TemplateId::PerformanceRate
                | TemplateId::ReportingStratum
                | TemplateId::SexSupplementalData
                | TemplateId::EthnicitySupplementalData
                | TemplateId::RaceSupplementalData
                | TemplateId::PayerSupplementalData
        )
    }

    /// Sections that become QPP measurement sets.
    pub fn is_section(&self) -> bool {
        matches!(
            self,
            TemplateId::AciSection | TemplateId::IaSection | TemplateId::MeasureSection
        )
    }

    /// Templates that become entries of a measurement set's `measurements`.
    pub fn is_measure(&self) -> bool {
        matches!(
            self,
            TemplateId::AciNumeratorDenominator
                | TemplateId::AciMeasurePerformed
                | TemplateId::IaMeasure
                | TemplateId::MeasureReferenceResults
        )
    }

    /// Look up a template by its XML identity.
    ///
    /// Versioned templates only match their own extension; unversioned templates match
    /// regardless of the extension present in the document.
    pub fn from_ids(root: &str, extension: Option<&str>) -> Option<TemplateId> {
        TemplateId::ALL
            .iter()
            .copied()
            .filter(|t| *t != TemplateId::Placeholder)
            .find(|t| {
                t.root() == root
                    && match t.extension() {
                        Some(expected) => extension == Some(expected),
                        None => true,
                    }
            })
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_roundtrips_through_ids() {
        for template in TemplateId::ALL.iter().filter(|t| **t != TemplateId::Placeholder) {
            assert_eq!(
                TemplateId::from_ids(template.root(), template.extension()),
                Some(*template),
                "{} should resolve from its own identity",
                template
            );
        }
    }

    #[test]
    fn test_versioned_template_requires_extension() {
        assert_eq!(
            TemplateId::from_ids("2.16.840.1.113883.10.20.27.1.2", Some("2016-11-01")),
            None
        );
        assert_eq!(
            TemplateId::from_ids("2.16.840.1.113883.10.20.27.1.2", None),
            None
        );
    }

    #[test]
    fn test_unversioned_template_ignores_extension() {
        assert_eq!(
            TemplateId::from_ids("2.16.840.1.113883.10.20.27.3.3", Some("anything")),
            Some(TemplateId::AggregateCount)
        );
    }

    #[test]
    fn test_placeholder_is_never_resolved() {
        assert_eq!(TemplateId::from_ids("", None), None);
    }
}
