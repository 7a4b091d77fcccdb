mod chart;
mod metric;
mod post;
mod ticket;

pub use chart::{ChartArtifact, ChartDescription, ChartKind, ColorSpec, Dataset};
pub use metric::{BugSnapshot, MetricPoint, MonthWindow};
pub use post::{BotIdentity, DeliveryPayload, FileId};
pub use ticket::{ReportBatch, TicketSummary, NO_SPRINT, UNASSIGNED};
