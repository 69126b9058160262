// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

pub mod ask;
pub mod init_config;
pub mod prompt;
pub mod schema;
pub mod sql;

pub use ask::ask_command;
pub use init_config::init_config_command;
pub use prompt::prompt_command;
pub use schema::schema_command;
pub use sql::sql_command;
