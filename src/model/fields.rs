//! Names of the [`super::Node`] fields written by decoders and read by encoders
//! and validators.

/// Program the report is submitted to (`MIPS_INDIV`, `MIPS_GROUP`)
pub const PROGRAM_NAME: &str = "programName";
/// `individual` or `group`, derived from the program name
pub const ENTITY_TYPE: &str = "entityType";
/// Taxpayer identification number
pub const TAX_ID: &str = "taxpayerIdentificationNumber";
/// National provider identifier
pub const NPI: &str = "nationalProviderIdentifier";
/// Four-digit performance year
pub const PERFORMANCE_YEAR: &str = "performanceYear";
/// Measurement set category (`aci`, `ia`, `quality`)
pub const CATEGORY: &str = "category";
/// How the measurement set was submitted
pub const SUBMISSION_METHOD: &str = "submissionMethod";
/// First day of the performance period
pub const PERFORMANCE_START: &str = "performanceStart";
/// Last day of the performance period
pub const PERFORMANCE_END: &str = "performanceEnd";
/// Measure or activity identifier
pub const MEASURE_ID: &str = "measureId";
/// Yes/no observation of a performed measure
pub const MEASURE_PERFORMED: &str = "measurePerformed";
/// Population code of a measure data entry
pub const MEASURE_TYPE: &str = "type";
/// Count reported for a population
pub const AGGREGATE_COUNT: &str = "aggregateCount";

/// Program name of an individual submission
pub const MIPS_INDIVIDUAL: &str = "MIPS_INDIV";
/// Program name of a group submission
pub const MIPS_GROUP: &str = "MIPS_GROUP";
/// Entity type of an individual submission
pub const ENTITY_INDIVIDUAL: &str = "individual";
/// Entity type of a group submission
pub const ENTITY_GROUP: &str = "group";
/// Submission method of every electronic measurement set
pub const ELECTRONIC_HEALTH_RECORD: &str = "electronicHealthRecord";
