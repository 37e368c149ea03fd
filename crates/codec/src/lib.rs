//! Codecs between Chef server wire documents and the `chef_wire_domain` model.
//!
//! - [`json`]: repeated-key maps and data bag items carrying an embedded `id`.
//! - [`keys`]: PEM key material inside JSON strings.
//! - [`version`]: cookbook decoders picked by the server generation.
//! - [`node_config`]: `client.rb`, `validation.pem`, first-boot document and
//!   `chef-client` command line.
//!
//! Every failure surfaces as a [`CodecError`]; nothing is retried here.

pub mod error;
pub mod json;
pub mod keys;
pub mod node_config;
pub mod version;

pub use error::{CodecError, CodecResult};
pub use json::{decode_item, decode_map, encode_item, encode_map, RepeatedKeyMap};
pub use keys::{decode_key, encode_key, Certificate, PemMaterial, PrivateKey, PublicKey, RsaKeyError};
pub use node_config::{
    assemble, chef_client_options, client_rb_lines, render_chef_client_command,
    validation_pem_lines, ChefClientOption,
};
pub use version::{CookbookClient, ServerVersion, VersionGate, VersionSource, WireFormat};
