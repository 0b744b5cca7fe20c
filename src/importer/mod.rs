// ==========================================
// 助学金受益人记录 - 导入层
// ==========================================
// 职责: 表格行 → 区域/子区域/机构/受益人记录
// 流程: 解析 → 校验 → 映射 → 解析参照 → upsert → 批次审计
// 支持: Excel, CSV, 已解析的行
// ==========================================

// 模块声明
pub mod batch_coordinator;
pub mod beneficiary_importer;
pub mod code_generator;
pub mod data_cleaner;
pub mod derivation;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod importer_trait;
pub mod reference_resolver;
pub mod row_validator;

// 重导出核心类型
pub use batch_coordinator::{BatchCoordinator, RowOutcome};
pub use beneficiary_importer::BeneficiaryImporter;
pub use code_generator::InstitutionCodeGenerator;
pub use data_cleaner::DataCleaner as DataCleanerImpl;
pub use derivation::DerivationService as DerivationServiceImpl;
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper as FieldMapperImpl;
pub use file_parser::{normalize_header, CsvParser, ExcelParser, UniversalFileParser};
pub use reference_resolver::{ReferenceResolver, ResolverStats};
pub use row_validator::{AllowedValues, RowValidation, RowValidator, ValidationRules};

// 重导出 Trait 接口
pub use importer_trait::{DataCleaner, DerivationService, FieldMapper, FileParser};
