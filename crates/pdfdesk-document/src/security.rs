//! Password protection with the PDF standard security handler.
//!
//! Documents are protected with RC4 and a 128-bit key (`/V 2 /R 3`).
//! Unlocking also accepts 40-bit (`/R 2`) files. AES handlers are reported
//! as unsupported.

use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat, dictionary};
use md5::{Digest, Md5};
use rc4::consts::U256;
use rc4::{Key, KeyInit, Rc4, StreamCipher};

use crate::error::{DocumentError, DocumentResult};
use crate::pages::{self, is_encrypted, resolve};

/// Password padding string from the PDF reference.
const PAD: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// Suffix appended to the user password to derive the owner password.
pub const OWNER_SUFFIX: &str = "_owner";

/// Low-resolution printing and accessibility extraction only.
pub const RESTRICTED_PERMISSIONS: i32 = -3388;

const KEY_BYTES: usize = 16;

/// Encrypt `source` so it opens with `password`. The owner password is
/// `password` followed by [`OWNER_SUFFIX`].
pub fn protect(source: &[u8], password: &str) -> DocumentResult<Vec<u8>> {
    if password.is_empty() {
        return Err(DocumentError::InvalidOption("Password is required".to_string()));
    }

    let mut doc = pages::load(source)?;
    let id = ensure_file_id(&mut doc);
    let owner_password = format!("{password}{OWNER_SUFFIX}");

    let handler = StandardHandler::create(
        password.as_bytes(),
        owner_password.as_bytes(),
        RESTRICTED_PERMISSIONS,
        id,
    );
    let key = handler.file_key(password.as_bytes());

    for (&object_id, object) in doc.objects.iter_mut() {
        if is_crypt_exempt(object) {
            continue;
        }
        crypt_object(object, &object_key(&key, object_id));
    }

    let encrypt_id = doc.add_object(handler.dictionary());
    doc.trailer.set("Encrypt", encrypt_id);

    tracing::debug!(objects = doc.objects.len(), "Encrypted PDF");
    pages::save(&mut doc)
}

/// Remove encryption from `source` using either its user or owner password.
/// An unencrypted input is re-saved unchanged.
pub fn unlock(source: &[u8], password: &str) -> DocumentResult<Vec<u8>> {
    let mut doc = pages::load_any(source)?;
    if !is_encrypted(&doc) {
        return pages::save(&mut doc);
    }

    let encrypt_ref = doc.trailer.get(b"Encrypt")?.as_reference().ok();
    let handler = StandardHandler::read(&doc)?;
    let key = handler
        .authenticate(password.as_bytes())
        .ok_or(DocumentError::IncorrectPassword)?;

    for (&object_id, object) in doc.objects.iter_mut() {
        if Some(object_id) == encrypt_ref || is_crypt_exempt(object) {
            continue;
        }
        crypt_object(object, &object_key(&key, object_id));
    }

    doc.trailer.remove(b"Encrypt");
    if let Some(id) = encrypt_ref {
        doc.objects.remove(&id);
    }

    tracing::debug!(revision = handler.revision, "Decrypted PDF");
    pages::save(&mut doc)
}

/// The standard security handler parameters of one document.
#[derive(Debug, Clone)]
struct StandardHandler {
    revision: i64,
    key_length: usize,
    owner_entry: Vec<u8>,
    user_entry: Vec<u8>,
    permissions: i32,
    file_id: Vec<u8>,
}

impl StandardHandler {
    /// New revision 3 handler for the given passwords.
    fn create(user: &[u8], owner: &[u8], permissions: i32, file_id: Vec<u8>) -> Self {
        let mut handler = Self {
            revision: 3,
            key_length: KEY_BYTES,
            owner_entry: Vec::new(),
            user_entry: Vec::new(),
            permissions,
            file_id,
        };
        handler.owner_entry = handler.compute_owner_entry(owner, user);
        let key = handler.file_key(user);
        handler.user_entry = handler.compute_user_entry(&key);
        handler
    }

    /// Read the handler from a document's `/Encrypt` dictionary.
    fn read(doc: &Document) -> DocumentResult<Self> {
        let dict = resolve(doc, doc.trailer.get(b"Encrypt")?).as_dict()?;

        let filter = dict.get(b"Filter").and_then(Object::as_name).unwrap_or(b"");
        if filter != b"Standard" {
            return Err(DocumentError::UnsupportedEncryption(format!(
                "security handler '{}'",
                String::from_utf8_lossy(filter)
            )));
        }

        let version = dict.get(b"V").and_then(Object::as_i64).unwrap_or(0);
        let revision = dict.get(b"R").and_then(Object::as_i64).unwrap_or(0);
        if !matches!(version, 1 | 2) || !matches!(revision, 2 | 3) {
            return Err(DocumentError::UnsupportedEncryption(format!(
                "V{version} R{revision}"
            )));
        }

        let key_length = if revision == 2 {
            5
        } else {
            let bits = dict.get(b"Length").and_then(Object::as_i64).unwrap_or(40);
            (bits / 8).clamp(5, 16) as usize
        };

        let string = |key: &[u8]| -> DocumentResult<Vec<u8>> {
            Ok(resolve(doc, dict.get(key)?).as_str()?.to_vec())
        };

        let file_id = doc
            .trailer
            .get(b"ID")
            .and_then(Object::as_array)
            .ok()
            .and_then(|ids| ids.first())
            .and_then(|first| resolve(doc, first).as_str().ok())
            .map(<[u8]>::to_vec)
            .unwrap_or_default();

        Ok(Self {
            revision,
            key_length,
            owner_entry: string(b"O")?,
            user_entry: string(b"U")?,
            permissions: dict.get(b"P").and_then(Object::as_i64).unwrap_or(0) as i32,
            file_id,
        })
    }

    fn dictionary(&self) -> Dictionary {
        dictionary! {
            "Filter" => "Standard",
            "V" => 2,
            "R" => self.revision,
            "Length" => (self.key_length * 8) as i64,
            "O" => Object::String(self.owner_entry.clone(), StringFormat::Hexadecimal),
            "U" => Object::String(self.user_entry.clone(), StringFormat::Hexadecimal),
            "P" => i64::from(self.permissions),
        }
    }

    /// Encryption key derived from a user password.
    fn file_key(&self, user: &[u8]) -> Vec<u8> {
        let mut hasher = Md5::new();
        hasher.update(pad(user));
        hasher.update(&self.owner_entry);
        hasher.update((self.permissions as u32).to_le_bytes());
        hasher.update(&self.file_id);
        let mut digest = hasher.finalize().to_vec();

        if self.revision >= 3 {
            for _ in 0..50 {
                digest = Md5::digest(&digest[..self.key_length]).to_vec();
            }
        }
        digest.truncate(self.key_length);
        digest
    }

    /// RC4 key protecting the `/O` entry.
    fn owner_key(&self, owner: &[u8]) -> Vec<u8> {
        let mut digest = Md5::digest(pad(owner)).to_vec();
        if self.revision >= 3 {
            for _ in 0..50 {
                digest = Md5::digest(&digest).to_vec();
            }
        }
        digest.truncate(self.key_length);
        digest
    }

    fn compute_owner_entry(&self, owner: &[u8], user: &[u8]) -> Vec<u8> {
        let owner = if owner.is_empty() { user } else { owner };
        let key = self.owner_key(owner);
        let mut data = crypt_rc4(&key, &pad(user));
        if self.revision >= 3 {
            for round in 1..=19u8 {
                data = crypt_rc4(&xor_key(&key, round), &data);
            }
        }
        data
    }

    fn compute_user_entry(&self, key: &[u8]) -> Vec<u8> {
        if self.revision == 2 {
            return crypt_rc4(key, &PAD);
        }

        let mut hasher = Md5::new();
        hasher.update(PAD);
        hasher.update(&self.file_id);
        let mut data = crypt_rc4(key, &hasher.finalize());
        for round in 1..=19u8 {
            data = crypt_rc4(&xor_key(key, round), &data);
        }
        // Only the first 16 bytes are significant.
        data.extend_from_slice(&PAD[..16]);
        data
    }

    /// Check a password against the user entry.
    fn authenticate_user(&self, password: &[u8]) -> Option<Vec<u8>> {
        let key = self.file_key(password);
        let expected = self.compute_user_entry(&key);
        let significant = if self.revision == 2 { 32 } else { 16 };
        let matches = self.user_entry.len() >= significant
            && expected[..significant] == self.user_entry[..significant];
        matches.then_some(key)
    }

    /// Recover the user password from the owner entry, then check it.
    fn authenticate_owner(&self, password: &[u8]) -> Option<Vec<u8>> {
        let key = self.owner_key(password);
        let mut data = self.owner_entry.clone();
        if self.revision == 2 {
            data = crypt_rc4(&key, &data);
        } else {
            for round in (0..=19u8).rev() {
                data = crypt_rc4(&xor_key(&key, round), &data);
            }
        }
        self.authenticate_user(&data)
    }

    /// File key for either password, or `None` if neither matches.
    fn authenticate(&self, password: &[u8]) -> Option<Vec<u8>> {
        self.authenticate_user(password)
            .or_else(|| self.authenticate_owner(password))
    }
}

/// Pad or truncate a password to 32 bytes.
fn pad(password: &[u8]) -> [u8; 32] {
    let mut out = PAD;
    let len = password.len().min(32);
    out[..len].copy_from_slice(&password[..len]);
    out[len..].copy_from_slice(&PAD[..32 - len]);
    out
}

fn xor_key(key: &[u8], round: u8) -> Vec<u8> {
    key.iter().map(|b| b ^ round).collect()
}

/// Per-object key: file key + object number + generation, hashed.
fn object_key(key: &[u8], (number, generation): ObjectId) -> Vec<u8> {
    let mut hasher = Md5::new();
    hasher.update(key);
    hasher.update(&number.to_le_bytes()[..3]);
    hasher.update(&generation.to_le_bytes()[..2]);
    let mut digest = hasher.finalize().to_vec();
    digest.truncate((key.len() + 5).min(16));
    digest
}

/// Cross-reference and object streams are never encrypted.
fn is_crypt_exempt(object: &Object) -> bool {
    match object {
        Object::Stream(stream) => matches!(
            stream.dict.get(b"Type").and_then(Object::as_name),
            Ok(b"XRef") | Ok(b"ObjStm")
        ),
        _ => false,
    }
}

/// Apply RC4 to every string and stream body inside `object`. RC4 is
/// symmetric, so the same call encrypts and decrypts.
fn crypt_object(object: &mut Object, key: &[u8]) {
    match object {
        Object::String(bytes, _) => *bytes = crypt_rc4(key, bytes),
        Object::Array(items) => {
            for item in items.iter_mut() {
                crypt_object(item, key);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter_mut() {
                crypt_object(value, key);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter_mut() {
                crypt_object(value, key);
            }
            stream.content = crypt_rc4(key, &stream.content);
        }
        _ => {}
    }
}

/// RC4 keystream XOR. The key schedule reads `key[i % len]`, so the key is
/// cycled out to the cipher's full 256-byte key size.
fn crypt_rc4(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut out = data.to_vec();
    if let Some(key) = Key::<U256>::from_exact_iter(key.iter().copied().cycle().take(256)) {
        Rc4::<U256>::new(&key).apply_keystream(&mut out);
    }
    out
}

/// First element of the trailer `/ID`, creating the array if missing.
fn ensure_file_id(doc: &mut Document) -> Vec<u8> {
    let existing = doc
        .trailer
        .get(b"ID")
        .and_then(Object::as_array)
        .ok()
        .and_then(|ids| ids.first())
        .and_then(|first| first.as_str().ok())
        .map(<[u8]>::to_vec);
    if let Some(id) = existing {
        return id;
    }

    let id = uuid::Uuid::new_v4().as_bytes().to_vec();
    doc.trailer.set(
        "ID",
        vec![
            Object::String(id.clone(), StringFormat::Hexadecimal),
            Object::String(id.clone(), StringFormat::Hexadecimal),
        ],
    );
    id
}
