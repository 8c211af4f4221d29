//! archedit Core Types and Definitions
//!
//! This crate provides the vocabulary shared by the archedit parser, editing
//! engine and CLI:
//!
//! - **Kinds**: the sum type of declaration kinds ([`kind::DeclarationKind`])
//!   and the subsets callers address ([`kind::ElementKind`], [`kind::IdKind`])
//! - **Paths**: validated System/Container/Component paths ([`path::ElementPath`])
//! - **Locators**: where an edited file lives ([`locator::FileLocator`]) and
//!   what an edit returns ([`locator::PatchResult`])

pub mod kind;
pub mod locator;
pub mod path;
