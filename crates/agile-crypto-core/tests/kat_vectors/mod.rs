mod aes_cbc;
mod evp_md5;
mod pbkdf2_sha1;
