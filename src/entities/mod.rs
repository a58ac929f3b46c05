//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod audit_log;
pub mod client;
pub mod inventory_movement;
pub mod invoice;
pub mod order_line;
pub mod product;
pub mod production_batch;
pub mod production_consumption;
pub mod production_order;
pub mod sales_order;
pub mod sequence;
pub mod supplier;
pub mod waste;

// Re-export specific types to avoid conflicts
pub use audit_log::{Column as AuditLogColumn, Entity as AuditLog, Model as AuditLogModel};
pub use client::{Column as ClientColumn, Entity as Client, Model as ClientModel};
pub use inventory_movement::{
    Column as InventoryMovementColumn, Entity as InventoryMovement,
    Model as InventoryMovementModel, MovementType,
};
pub use invoice::{Column as InvoiceColumn, Entity as Invoice, InvoiceStatus, Model as InvoiceModel};
pub use order_line::{Column as OrderLineColumn, Entity as OrderLine, Model as OrderLineModel};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel, ProductType};
pub use production_batch::{
    BatchQuality, Column as ProductionBatchColumn, Entity as ProductionBatch,
    Model as ProductionBatchModel,
};
pub use production_consumption::{
    Column as ProductionConsumptionColumn, Entity as ProductionConsumption,
    Model as ProductionConsumptionModel,
};
pub use production_order::{
    Column as ProductionOrderColumn, Entity as ProductionOrder, Model as ProductionOrderModel,
    Priority, ProductionOrderStatus,
};
pub use sales_order::{
    Column as SalesOrderColumn, Entity as SalesOrder, Model as SalesOrderModel, SalesOrderStatus,
};
pub use sequence::{Column as SequenceColumn, Entity as Sequence, Model as SequenceModel};
pub use supplier::{Column as SupplierColumn, Entity as Supplier, Model as SupplierModel};
pub use waste::{Column as WasteColumn, Entity as Waste, Model as WasteModel};
