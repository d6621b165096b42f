use phonebook_core::error::{DirectoryError, Result};
use phonebook_core::ids::{ProfileId, VouchId};
use phonebook_core::vouch::{Vouch, VouchRepository};

use super::DirectoryStore;

fn sorted_by_date(mut vouches: Vec<Vouch>) -> Vec<Vouch> {
    vouches.sort_by_key(|vouch| vouch.date);
    vouches
}

impl VouchRepository for DirectoryStore {
    fn insert_bounded(&self, vouch: Vouch, limit: usize) -> Result<usize> {
        if vouch.voucher == Some(vouch.vouchee) {
            return Err(DirectoryError::conflict("vouch", vouch.vouchee.to_string()));
        }
        let mut state = self.write()?;
        let received = state
            .vouches
            .values()
            .filter(|existing| existing.vouchee == vouch.vouchee);

        let mut count = 0;
        for existing in received {
            count += 1;
            if vouch.voucher.is_some() && existing.voucher == vouch.voucher {
                return Err(DirectoryError::conflict(
                    "vouch",
                    format!("{:?}->{}", vouch.voucher, vouch.vouchee),
                ));
            }
        }
        if count >= limit {
            return Err(DirectoryError::conflict(
                "vouch limit",
                vouch.vouchee.to_string(),
            ));
        }

        state.vouches.insert(vouch.id, vouch);
        Ok(count + 1)
    }

    fn find_by_id(&self, id: VouchId) -> Result<Option<Vouch>> {
        Ok(self.read()?.vouches.get(&id).cloned())
    }

    fn find_received(&self, vouchee: ProfileId) -> Result<Vec<Vouch>> {
        let state = self.read()?;
        Ok(sorted_by_date(
            state
                .vouches
                .values()
                .filter(|vouch| vouch.vouchee == vouchee)
                .cloned()
                .collect(),
        ))
    }

    fn find_made(&self, voucher: ProfileId) -> Result<Vec<Vouch>> {
        let state = self.read()?;
        Ok(sorted_by_date(
            state
                .vouches
                .values()
                .filter(|vouch| vouch.voucher == Some(voucher))
                .cloned()
                .collect(),
        ))
    }

    fn delete(&self, id: VouchId) -> Result<Option<Vouch>> {
        Ok(self.write()?.vouches.remove(&id))
    }

    fn delete_received(&self, vouchee: ProfileId) -> Result<Vec<Vouch>> {
        let mut state = self.write()?;
        let ids: Vec<VouchId> = state
            .vouches
            .values()
            .filter(|vouch| vouch.vouchee == vouchee)
            .map(|vouch| vouch.id)
            .collect();
        Ok(ids
            .iter()
            .filter_map(|id| state.vouches.remove(id))
            .collect())
    }

    fn detach_voucher(&self, voucher: ProfileId) -> Result<Vec<Vouch>> {
        let mut state = self.write()?;
        let mut detached = Vec::new();
        for vouch in state.vouches.values_mut() {
            if vouch.voucher == Some(voucher) {
                vouch.voucher = None;
                detached.push(vouch.clone());
            }
        }
        Ok(detached)
    }
}
