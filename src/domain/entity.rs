// ==========================================
// 车队管理后台 - 可导入实体类型
// ==========================================
// 职责: 声明各实体类型的内置列集合
// 说明: 新增实体时在此登记，导入管道本身无需改动
// ==========================================

use crate::domain::column::{ColumnDescriptor, ColumnSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Part,
    Customer,
    Vehicle,
    Driver,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Part,
        EntityKind::Customer,
        EntityKind::Vehicle,
        EntityKind::Driver,
    ];

    /// 实体名称（模板文件名取其小写）
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Part => "Part",
            EntityKind::Customer => "Customer",
            EntityKind::Vehicle => "Vehicle",
            EntityKind::Driver => "Driver",
        }
    }

    pub fn column_set(&self) -> ColumnSet {
        let columns = match self {
            EntityKind::Part => vec![
                ColumnDescriptor::new("part_number", "Part Number")
                    .required()
                    .alias("SKU"),
                ColumnDescriptor::new("name", "Name").required(),
                ColumnDescriptor::new("category", "Category"),
                ColumnDescriptor::new("unit_price", "Unit Price")
                    .number()
                    .required()
                    .alias("Price"),
                ColumnDescriptor::new("stock_quantity", "Stock Quantity")
                    .number()
                    .alias("Qty"),
                ColumnDescriptor::new("supplier", "Supplier"),
            ],
            EntityKind::Customer => vec![
                ColumnDescriptor::new("name", "Name").required(),
                ColumnDescriptor::new("tax_id", "Tax ID").alias("RFC"),
                ColumnDescriptor::new("email", "Email").alias("E-mail"),
                ColumnDescriptor::new("phone", "Phone"),
                ColumnDescriptor::new("address", "Address"),
                ColumnDescriptor::new("credit_limit", "Credit Limit").number(),
            ],
            EntityKind::Vehicle => vec![
                ColumnDescriptor::new("plate", "License Plate")
                    .required()
                    .alias("Plate No."),
                ColumnDescriptor::new("vin", "VIN"),
                ColumnDescriptor::new("brand", "Brand").required(),
                ColumnDescriptor::new("model", "Model").required(),
                ColumnDescriptor::new("year", "Year").number().required(),
                ColumnDescriptor::new("mileage", "Mileage").number(),
                ColumnDescriptor::new("insurance_expiry", "Insurance Expiry").date(),
            ],
            EntityKind::Driver => vec![
                ColumnDescriptor::new("full_name", "Full Name").required(),
                ColumnDescriptor::new("license_number", "License Number").required(),
                ColumnDescriptor::new("license_expiry", "License Expiry")
                    .date()
                    .required(),
                ColumnDescriptor::new("phone", "Phone"),
                ColumnDescriptor::new("hire_date", "Hire Date").date(),
            ],
        };
        ColumnSet::builtin(self.name(), columns)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "part" | "parts" => Ok(EntityKind::Part),
            "customer" | "customers" => Ok(EntityKind::Customer),
            "vehicle" | "vehicles" => Ok(EntityKind::Vehicle),
            "driver" | "drivers" => Ok(EntityKind::Driver),
            other => Err(format!("未知实体类型: {}", other)),
        }
    }
}
