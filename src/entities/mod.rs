pub mod client;
pub mod quality;
pub mod report;
pub mod report_item;

pub use client::{Entity as Client, Model as ClientModel};
pub use quality::{Entity as Quality, Model as QualityModel};
pub use report::{Entity as Report, Model as ReportModel};
pub use report_item::{Entity as ReportItem, Model as ReportItemModel};
